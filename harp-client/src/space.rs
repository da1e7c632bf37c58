//! Space address resolution
//!
//! Users name a remote app in several ways. All of them resolve to the base
//! URL of the Gradio server:
//! - `http://localhost:7860`, `https://abc123.gradio.live`, any `http(s)://` URL
//! - `https://huggingface.co/spaces/<user>/<model>`
//! - `https://<user>-<model>.hf.space`
//! - `<user>/<model>`

use crate::error::{ClientError, Result};

const HUGGINGFACE_SPACES: &str = "huggingface.co/spaces/";
const HF_SPACE_DOMAIN: &str = ".hf.space";

/// A resolved space address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceAddress {
    /// What the user typed
    pub user_input: String,
    /// Base URL of the Gradio server, without trailing slash
    pub gradio_url: String,
    /// Hugging Face page of the space, when hosted there
    pub huggingface_url: Option<String>,
}

impl SpaceAddress {
    /// Parse a user-supplied space address
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ClientError::InvalidUrl("empty address".to_string()));
        }

        if let Some((_, path)) = input.split_once(HUGGINGFACE_SPACES) {
            let mut parts = path.split('/').filter(|p| !p.is_empty());
            return match (parts.next(), parts.next()) {
                (Some(user), Some(model)) => Ok(Self::hosted(input, user, model)),
                _ => Err(ClientError::InvalidUrl(format!(
                    "could not find user and model in {}",
                    input
                ))),
            };
        }

        if input.contains(HF_SPACE_DOMAIN) {
            let host = input
                .split_once("://")
                .map(|(_, rest)| rest)
                .unwrap_or(input);
            let subdomain = host
                .split(HF_SPACE_DOMAIN)
                .next()
                .unwrap_or_default();
            return match subdomain.split_once('-') {
                Some((user, model)) if !user.is_empty() && !model.is_empty() => {
                    Ok(Self::hosted(input, user, model))
                }
                _ => Err(ClientError::InvalidUrl(format!(
                    "no hyphen between user and model in {}",
                    subdomain
                ))),
            };
        }

        if input.starts_with("http://") || input.starts_with("https://") {
            return Ok(Self::direct(input, input));
        }

        if input.starts_with("localhost") || input.starts_with("127.0.0.1") {
            return Ok(Self::direct(input, &format!("http://{}", input)));
        }

        if !input.contains("://") {
            let parts: Vec<&str> = input.split('/').collect();
            if let [user, model] = parts.as_slice() {
                if !user.is_empty() && !model.is_empty() {
                    return Ok(Self::hosted(input, user, model));
                }
            }
        }

        Err(ClientError::InvalidUrl(format!(
            "{} does not match any of the expected patterns",
            input
        )))
    }

    fn direct(input: &str, url: &str) -> Self {
        Self {
            user_input: input.to_string(),
            gradio_url: url.trim_end_matches('/').to_string(),
            huggingface_url: None,
        }
    }

    fn hosted(input: &str, user: &str, model: &str) -> Self {
        let subdomain = format!("{}-{}", user, model)
            .to_lowercase()
            .replace(['_', '.'], "-");
        Self {
            user_input: input.to_string(),
            gradio_url: format!("https://{}{}", subdomain, HF_SPACE_DOMAIN),
            huggingface_url: Some(format!("https://huggingface.co/spaces/{}/{}", user, model)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_url_is_used_as_is() {
        let space = SpaceAddress::parse("http://localhost:7860/").unwrap();
        assert_eq!(space.gradio_url, "http://localhost:7860");
        assert!(space.huggingface_url.is_none());
    }

    #[test]
    fn test_bare_localhost_gets_scheme() {
        let space = SpaceAddress::parse("localhost:7860").unwrap();
        assert_eq!(space.gradio_url, "http://localhost:7860");
    }

    #[test]
    fn test_gradio_live_url() {
        let space = SpaceAddress::parse("https://1234abcd.gradio.live").unwrap();
        assert_eq!(space.gradio_url, "https://1234abcd.gradio.live");
    }

    #[test]
    fn test_huggingface_url() {
        let space =
            SpaceAddress::parse("https://huggingface.co/spaces/xribene/midi_pitch_shifter").unwrap();
        assert_eq!(space.gradio_url, "https://xribene-midi-pitch-shifter.hf.space");
        assert_eq!(
            space.huggingface_url.as_deref(),
            Some("https://huggingface.co/spaces/xribene/midi_pitch_shifter")
        );
    }

    #[test]
    fn test_hf_space_url() {
        let space = SpaceAddress::parse("https://xribene-midi-pitch-shifter.hf.space/").unwrap();
        assert_eq!(space.gradio_url, "https://xribene-midi-pitch-shifter.hf.space");
        assert!(space.huggingface_url.is_some());
    }

    #[test]
    fn test_user_model_shorthand() {
        let space = SpaceAddress::parse("hugggof/pitch_shifter").unwrap();
        assert_eq!(space.gradio_url, "https://hugggof-pitch-shifter.hf.space");
    }

    #[test]
    fn test_invalid_addresses() {
        assert!(SpaceAddress::parse("").is_err());
        assert!(SpaceAddress::parse("https://huggingface.co/spaces/onlyuser").is_err());
        assert!(SpaceAddress::parse("https://nohyphen.hf.space").is_err());
        assert!(SpaceAddress::parse("a/b/c").is_err());
        assert!(SpaceAddress::parse("ftp://example.com").is_err());
    }
}
