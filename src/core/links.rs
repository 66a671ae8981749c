use crate::core::domain::{ArtifactRecord, LinkMode, LinkedArtifact};

pub fn resolve_links(record: ArtifactRecord, mode: LinkMode, base_url: &str) -> LinkedArtifact {
    let base = base_url.trim_end_matches('/');

    let (url, iframe_url) = match mode {
        LinkMode::Rest => (
            format!("{}/files/{}", base, record.filename),
            Some(format!("{}/view/{}", base, record.filename)),
        ),
        LinkMode::Plain => (format!("{}/{}", base, record.filename), None),
    };

    LinkedArtifact {
        record,
        url: Some(url),
        iframe_url,
    }
}
