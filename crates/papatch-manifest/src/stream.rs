use serde::{Deserialize, Serialize};

/// A named deployment channel as advertised by the stream catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stream {
    #[serde(rename = "StreamName")]
    pub name: String,
    #[serde(rename = "DownloadUrl")]
    pub download_url: String,
    #[serde(rename = "TitleFolder")]
    pub title_folder: String,
    #[serde(rename = "ManifestName")]
    pub manifest_name: String,
    /// Query/token fragment appended verbatim to every download URL.
    #[serde(rename = "AuthSuffix", default)]
    pub auth_suffix: String,
}

impl Stream {
    fn title_base(&self) -> String {
        format!(
            "{}/{}",
            self.download_url.trim_end_matches('/'),
            self.title_folder.trim_matches('/')
        )
    }

    pub fn manifest_url(&self) -> String {
        format!("{}/{}{}", self.title_base(), self.manifest_name, self.auth_suffix)
    }

    pub fn bundle_url(&self, checksum: &str) -> String {
        format!("{}/hashed/{}{}", self.title_base(), checksum, self.auth_suffix)
    }
}
