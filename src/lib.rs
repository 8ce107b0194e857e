pub mod config;
pub mod decompose;
pub mod error;
pub mod gazetteer;
pub mod logging;
pub mod pipeline;
pub mod records;
pub mod resolver;

pub use config::Config;
pub use decompose::{AddressDecomposer, DecomposedAddress};
pub use error::{ConvertError, Result};
pub use gazetteer::Gazetteer;
pub use pipeline::{ConversionSummary, Pipeline};
pub use records::{PostalAddress, RawClubRecord, SportsOrganization};
pub use resolver::{CountySource, OfflineCountySource, PostcodeResolver};
