//! I/O side of fetching: the transport seam and the bundle fetcher.

mod fetcher;
mod http;
#[cfg(feature = "test-util")]
mod memory;

pub use fetcher::{FetchReport, Fetcher};
pub use http::{Body, BoxStream, HttpClient};
#[cfg(feature = "test-util")]
pub use memory::{MemoryClient, MemoryClientError};

#[cfg(feature = "reqwest")]
pub use http::{ClientSetting, ClientSettingError, ReqwestClient};
