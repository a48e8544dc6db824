pub mod export;
pub mod layout;
pub mod model;

pub use layout::{LayoutConfig, LayoutEngine, layout};
pub use model::{Edge, GraphInput, LayoutPolicy, LayoutResult, PageNode, Position};

pub fn print_banner() {
    println!(
        r#"
   ___  ___ ____ ____ __ _  ___ _  ___
  / _ \/ _ `/ _ `/ -_)  ' \/ _ `/ / _ \
 / .__/\_,_/\_, /\__/_/_/_/\_,_/ / .__/
/_/        /___/                /_/     v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
