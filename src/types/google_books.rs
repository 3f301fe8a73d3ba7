use serde::Deserialize;

/// `GET volumes?q=isbn:{isbn}` response; only the fields used for covers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VolumesResponse {
    #[serde(default)]
    pub items: Vec<Volume>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    #[serde(default)]
    pub volume_info: VolumeInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeInfo {
    pub title: Option<String>,
    pub image_links: Option<ImageLinks>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLinks {
    pub small_thumbnail: Option<String>,
    pub thumbnail: Option<String>,
}

impl VolumesResponse {
    /// First volume's thumbnail link, falling back to the small thumbnail.
    pub fn thumbnail_link(&self) -> Option<&str> {
        let links = self.items.first()?.volume_info.image_links.as_ref()?;
        links
            .thumbnail
            .as_deref()
            .or(links.small_thumbnail.as_deref())
            .filter(|s| !s.trim().is_empty())
    }
}
