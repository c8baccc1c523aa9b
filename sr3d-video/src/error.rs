pub type VideoResult<T> = Result<T, VideoError>;

#[derive(thiserror::Error, Debug)]
pub enum VideoError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("mesh error: {0}")]
    Mesh(#[from] sr3d_core::StlError),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VideoError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(VideoError::validation("x")
            .to_string()
            .contains("validation error:"));
        assert!(VideoError::encode("x").to_string().contains("encode error:"));
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = VideoError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
