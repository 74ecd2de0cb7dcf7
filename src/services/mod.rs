pub mod brand;
pub mod copy;
pub mod image;
pub mod text;
pub mod traits;

pub use brand::{BrandResolution, BrandResolver};
pub use copy::CopyClient;
pub use image::HttpImageService;
pub use text::HttpTextService;
pub use traits::{ImageService, TextService};
