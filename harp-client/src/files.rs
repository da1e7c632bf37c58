//! File arguments and outputs
//!
//! Positional arguments whose declared parameter kind is `Filepath` are local
//! paths: they are uploaded first and sent as file references. File outputs
//! are downloaded into the client's download directory.

use harp_core::domain::endpoint::{EndpointSignature, ParamKind};
use harp_core::dto::file::FileData;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::RemoteClient;
use crate::error::{ClientError, Result};

/// A positional argument after matching it against its declared parameter
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// Sent verbatim
    Value(Value),
    /// Local file to upload and send as a file reference
    File(PathBuf),
}

/// Match positional arguments against an endpoint signature
///
/// Exactly the arguments whose declared kind is `Filepath` become
/// [`Argument::File`]; order is preserved. A null file argument (an optional
/// input left empty) or an already-wrapped file reference passes through.
pub fn bind_arguments(signature: &EndpointSignature, args: Vec<Value>) -> Result<Vec<Argument>> {
    if args.len() != signature.arity() {
        return Err(ClientError::ArgumentMismatch {
            endpoint: signature.api_name.clone(),
            expected: signature.arity(),
            actual: args.len(),
        });
    }

    signature
        .params
        .iter()
        .zip(args)
        .enumerate()
        .map(|(index, (kind, value))| match (kind, value) {
            (ParamKind::Value, value) => Ok(Argument::Value(value)),
            (ParamKind::Filepath, Value::String(path)) => Ok(Argument::File(PathBuf::from(path))),
            (ParamKind::Filepath, Value::Null) => Ok(Argument::Value(Value::Null)),
            (ParamKind::Filepath, value) if FileData::from_output(&value).is_some() => {
                Ok(Argument::Value(value))
            }
            (ParamKind::Filepath, value) => Err(ClientError::InvalidArgument(format!(
                "parameter {} of {} expects a file path, got {}",
                index, signature.api_name, value
            ))),
        })
        .collect()
}

impl RemoteClient {
    /// Upload local files and produce the JSON payload of a call
    pub(crate) async fn encode_arguments(&self, args: Vec<Argument>) -> Result<Vec<Value>> {
        let mut data = Vec::with_capacity(args.len());
        for arg in args {
            let value = match arg {
                Argument::Value(value) => value,
                Argument::File(path) => {
                    let file = self.upload_file(&path).await?;
                    serde_json::to_value(file)
                        .map_err(|e| ClientError::InternalError(e.to_string()))?
                }
            };
            data.push(value);
        }
        Ok(data)
    }

    /// Upload a local file to the service
    ///
    /// # Returns
    /// A file reference to the uploaded copy
    pub async fn upload_file(&self, path: &Path) -> Result<FileData> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ClientError::InvalidArgument(format!("cannot read {}: {}", path.display(), e))
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        debug!("Uploading {} ({} bytes)", path.display(), bytes.len());

        let form = Form::new().part("files", Part::bytes(bytes).file_name(name.clone()));
        let url = format!("{}/upload", self.base_url);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .timeout(self.request_timeout)
            .send()
            .await?;

        let paths: Vec<String> = Self::handle_response(response).await?;
        let remote_path = paths
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::ParseError("upload returned no path".to_string()))?;

        info!("Uploaded {} as {}", path.display(), remote_path);
        Ok(FileData::uploaded(remote_path, Some(name)))
    }

    /// Download a file output into `<download_dir>/<job_id>/`
    pub(crate) async fn download_file(&self, file: &FileData, job_id: &str) -> Result<PathBuf> {
        let url = match &file.url {
            Some(url) if url.starts_with("http://") || url.starts_with("https://") => url.clone(),
            _ => format!("{}/file={}", self.base_url, file.path),
        };

        let name = Path::new(file.file_name())
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "output".into());
        let dir = self.download_dir.join(job_id);
        tokio::fs::create_dir_all(&dir).await?;
        let dest = dir.join(name);

        debug!("Downloading {} to {}", url, dest.display());

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }
        let bytes = response.bytes().await?;
        tokio::fs::write(&dest, &bytes).await?;

        info!("Downloaded result to {}", dest.display());
        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn process_signature() -> EndpointSignature {
        EndpointSignature::new("/process", vec![ParamKind::Filepath, ParamKind::Value])
    }

    #[test]
    fn test_bind_wraps_only_filepath_parameters() {
        let args = bind_arguments(&process_signature(), vec![json!("input.wav"), json!(7)]).unwrap();
        assert_eq!(
            args,
            vec![
                Argument::File(PathBuf::from("input.wav")),
                Argument::Value(json!(7)),
            ]
        );
    }

    #[test]
    fn test_bind_keeps_strings_for_value_parameters() {
        let signature = EndpointSignature::new(
            "/process",
            vec![ParamKind::Value, ParamKind::Filepath, ParamKind::Value],
        );
        let args = bind_arguments(
            &signature,
            vec![json!("looks/like/a/path.wav"), json!("song.mid"), json!(true)],
        )
        .unwrap();

        assert_eq!(args[0], Argument::Value(json!("looks/like/a/path.wav")));
        assert_eq!(args[1], Argument::File(PathBuf::from("song.mid")));
        assert_eq!(args[2], Argument::Value(json!(true)));
    }

    #[test]
    fn test_bind_rejects_count_mismatch() {
        let err = bind_arguments(&process_signature(), vec![json!("input.wav")]).unwrap_err();
        assert!(matches!(
            err,
            ClientError::ArgumentMismatch {
                expected: 2,
                actual: 1,
                ..
            }
        ));
        assert!(err.is_caller_error());
    }

    #[test]
    fn test_bind_rejects_non_path_for_file_parameter() {
        let err = bind_arguments(&process_signature(), vec![json!(3), json!(7)]).unwrap_err();
        assert!(matches!(err, ClientError::InvalidArgument(_)));
    }

    #[test]
    fn test_bind_passes_null_and_wrapped_files_through() {
        let wrapped = json!({"path": "/tmp/gradio/a.wav", "meta": {"_type": "gradio.FileData"}});
        let args = bind_arguments(&process_signature(), vec![wrapped.clone(), json!(0)]).unwrap();
        assert_eq!(args[0], Argument::Value(wrapped));

        let args = bind_arguments(&process_signature(), vec![Value::Null, json!(0)]).unwrap();
        assert_eq!(args[0], Argument::Value(Value::Null));
    }
}
