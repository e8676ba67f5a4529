//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from ufs-core.

use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_smithy_types::error::display::DisplayErrorContext;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use ufs_core::{
    DeleteOutcome, Error, KeyError, ListOptions, ListResult, ObjectInfo, ObjectPath, ObjectStore,
    Result, S3Settings,
};

/// S3 client wrapper
pub struct S3Client {
    inner: aws_sdk_s3::Client,
}

impl std::fmt::Debug for S3Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Client").finish_non_exhaustive()
    }
}

impl S3Client {
    /// Create a new S3 client from the `[s3]` settings
    ///
    /// Static credentials are used when both keys are set; otherwise the
    /// SDK's default provider chain resolves them.
    pub async fn new(settings: &S3Settings) -> Result<Self> {
        settings.validate()?;

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let (Some(access_key), Some(secret_key)) = (&settings.access_key, &settings.secret_key) {
            let credentials = aws_credential_types::Credentials::new(
                access_key,
                secret_key,
                None, // session token
                None, // expiry
                "ufs-static-credentials",
            );
            loader = loader.credentials_provider(credentials);
        }
        if let Some(region) = &settings.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        if let Some(endpoint) = &settings.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(path_style(settings))
            .build();

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
        })
    }

    /// Get the underlying aws-sdk-s3 client
    pub fn inner(&self) -> &aws_sdk_s3::Client {
        &self.inner
    }
}

/// Whether requests address buckets in the path rather than the host name
///
/// `auto` picks path style for custom endpoints, which rarely have
/// wildcard DNS, and virtual-hosted style for AWS itself.
fn path_style(settings: &S3Settings) -> bool {
    match settings.bucket_lookup.as_str() {
        "path" => true,
        "dns" => false,
        _ => settings.endpoint.is_some(),
    }
}

/// Map an SDK failure onto the core error taxonomy
///
/// Uses the service error code and the raw HTTP status, never the message
/// text. HEAD responses carry no body, so for them the status is all there is.
fn classify<E>(err: SdkError<E>, target: &str) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let status = err.raw_response().map(|r| r.status().as_u16());
    let code = err.code().map(str::to_string);
    match (code.as_deref(), status) {
        (Some("NoSuchKey" | "NotFound" | "NoSuchBucket"), _) | (_, Some(404)) => {
            Error::NotFound(target.to_string())
        }
        (Some("AccessDenied" | "Forbidden" | "AllAccessDisabled"), _) | (_, Some(403)) => {
            Error::AccessDenied(target.to_string())
        }
        _ => Error::Network(format!("{target}: {}", DisplayErrorContext(&err))),
    }
}

fn object_info(key: &str, size: Option<i64>) -> ObjectInfo {
    ObjectInfo::file(key, size.unwrap_or(0))
}

fn timestamp(value: &aws_smithy_types::DateTime) -> Option<jiff::Timestamp> {
    jiff::Timestamp::from_second(value.secs()).ok()
}

fn trim_etag(etag: &str) -> String {
    etag.trim_matches('"').to_string()
}

/// `x-amz-copy-source` value: the key is percent-encoded segment by segment
fn copy_source(src: &ObjectPath) -> String {
    let key = src
        .key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("{}/{key}", src.bucket)
}

/// Stream an object body into `writer`
///
/// Read failures come from the network; write failures are local I/O.
async fn write_body<R, W>(mut reader: R, writer: &mut W, src: &ObjectPath) -> Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; 64 * 1024];
    let mut written = 0u64;
    loop {
        let n = reader
            .read(&mut buf)
            .await
            .map_err(|e| Error::Network(format!("{src}: {e}")))?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n]).await?;
        written += n as u64;
    }
    writer.flush().await?;
    Ok(written)
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn list_objects(&self, bucket: &str, options: ListOptions) -> Result<ListResult> {
        let mut request = self
            .inner
            .list_objects_v2()
            .bucket(bucket)
            .prefix(&options.prefix);

        if let Some(delimiter) = &options.delimiter {
            request = request.delimiter(delimiter);
        }
        if let Some(max) = options.max_keys {
            request = request.max_keys(max);
        }
        if let Some(token) = &options.continuation_token {
            request = request.continuation_token(token);
        }

        let target = format!("{bucket}/{}", options.prefix);
        let response = request.send().await.map_err(|e| classify(e, &target))?;

        let mut items = Vec::new();

        for prefix in response.common_prefixes() {
            if let Some(p) = prefix.prefix() {
                items.push(ObjectInfo::dir(p));
            }
        }

        for object in response.contents() {
            let key = object.key().unwrap_or_default();
            let mut info = object_info(key, object.size());
            info.last_modified = object.last_modified().and_then(timestamp);
            info.etag = object.e_tag().map(trim_etag);
            items.push(info);
        }

        debug!(bucket, prefix = %options.prefix, items = items.len(), "Listed page");
        Ok(ListResult {
            items,
            truncated: response.is_truncated().unwrap_or(false),
            continuation_token: response.next_continuation_token().map(|s| s.to_string()),
        })
    }

    async fn head_object(&self, path: &ObjectPath) -> Result<ObjectInfo> {
        let response = self
            .inner
            .head_object()
            .bucket(&path.bucket)
            .key(&path.key)
            .send()
            .await
            .map_err(|e| classify(e, &path.to_string()))?;

        let mut info = object_info(&path.key, response.content_length());
        info.last_modified = response.last_modified().and_then(timestamp);
        info.etag = response.e_tag().map(trim_etag);
        info.content_type = response.content_type().map(|s| s.to_string());
        Ok(info)
    }

    async fn fetch_object_info(&self, path: &ObjectPath) -> Result<ObjectInfo> {
        let response = self
            .inner
            .get_object()
            .bucket(&path.bucket)
            .key(&path.key)
            .send()
            .await
            .map_err(|e| classify(e, &path.to_string()))?;

        let mut info = object_info(&path.key, response.content_length());
        info.last_modified = response.last_modified().and_then(timestamp);
        info.etag = response.e_tag().map(trim_etag);
        info.content_type = response.content_type().map(|s| s.to_string());
        // the body is dropped unread; only the headers were wanted
        drop(response.body);
        Ok(info)
    }

    async fn get_object(&self, path: &ObjectPath) -> Result<Vec<u8>> {
        let response = self
            .inner
            .get_object()
            .bucket(&path.bucket)
            .key(&path.key)
            .send()
            .await
            .map_err(|e| classify(e, &path.to_string()))?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| Error::Network(format!("{path}: {e}")))?
            .into_bytes()
            .to_vec();

        Ok(data)
    }

    async fn put_object(&self, path: &ObjectPath, data: Vec<u8>) -> Result<ObjectInfo> {
        let size = data.len() as i64;
        let content_type = mime_guess::from_path(&path.key).first_or_octet_stream();

        let response = self
            .inner
            .put_object()
            .bucket(&path.bucket)
            .key(&path.key)
            .content_type(content_type.essence_str())
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| classify(e, &path.to_string()))?;

        let mut info = ObjectInfo::file(&path.key, size);
        info.etag = response.e_tag().map(trim_etag);
        info.last_modified = Some(jiff::Timestamp::now());
        Ok(info)
    }

    async fn delete_object(&self, path: &ObjectPath) -> Result<()> {
        self.inner
            .delete_object()
            .bucket(&path.bucket)
            .key(&path.key)
            .send()
            .await
            .map_err(|e| classify(e, &path.to_string()))?;

        Ok(())
    }

    async fn delete_objects(&self, bucket: &str, keys: Vec<String>) -> Result<DeleteOutcome> {
        if keys.is_empty() {
            return Ok(DeleteOutcome::default());
        }

        let objects = keys
            .iter()
            .map(|k| ObjectIdentifier::builder().key(k).build())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::General(e.to_string()))?;

        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(false)
            .build()
            .map_err(|e| Error::General(e.to_string()))?;

        let response = self
            .inner
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| classify(e, bucket))?;

        let deleted = response
            .deleted()
            .iter()
            .filter_map(|d| d.key().map(|k| k.to_string()))
            .collect();

        let errors = response
            .errors()
            .iter()
            .map(|e| KeyError {
                key: e.key().unwrap_or_default().to_string(),
                code: e.code().map(|s| s.to_string()),
                message: e.message().map(|s| s.to_string()),
            })
            .collect();

        Ok(DeleteOutcome { deleted, errors })
    }

    async fn copy_object(&self, src: &ObjectPath, dst: &ObjectPath) -> Result<()> {
        self.inner
            .copy_object()
            .copy_source(copy_source(src))
            .bucket(&dst.bucket)
            .key(&dst.key)
            .send()
            .await
            .map_err(|e| classify(e, &src.to_string()))?;

        Ok(())
    }

    async fn download_to_file(&self, src: &ObjectPath, dst: &Path) -> Result<u64> {
        let response = self
            .inner
            .get_object()
            .bucket(&src.bucket)
            .key(&src.key)
            .send()
            .await
            .map_err(|e| classify(e, &src.to_string()))?;

        let reader = response.body.into_async_read();
        tokio::pin!(reader);
        let mut file = tokio::fs::File::create(dst).await?;
        let written = write_body(reader, &mut file, src).await?;

        debug!(src = %src, dst = %dst.display(), bytes = written, "Downloaded object");
        Ok(written)
    }

    async fn upload_from_file(&self, src: &Path, dst: &ObjectPath) -> Result<()> {
        let body = ByteStream::from_path(src)
            .await
            .map_err(|e| Error::General(format!("{}: {e}", src.display())))?;
        let content_type = mime_guess::from_path(src).first_or_octet_stream();

        self.inner
            .put_object()
            .bucket(&dst.bucket)
            .key(&dst.key)
            .content_type(content_type.essence_str())
            .body(body)
            .send()
            .await
            .map_err(|e| classify(e, &dst.to_string()))?;

        debug!(src = %src.display(), dst = %dst, "Uploaded file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ufs_core::Protocol;

    fn settings(endpoint: Option<&str>, lookup: &str) -> S3Settings {
        S3Settings {
            endpoint: endpoint.map(str::to_string),
            bucket_lookup: lookup.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_path_style_selection() {
        assert!(path_style(&settings(None, "path")));
        assert!(!path_style(&settings(Some("http://localhost:9000"), "dns")));
        assert!(path_style(&settings(Some("http://localhost:9000"), "auto")));
        assert!(!path_style(&settings(None, "auto")));
    }

    #[test]
    fn test_trim_etag() {
        assert_eq!(trim_etag("\"abc123\""), "abc123");
        assert_eq!(trim_etag("abc123"), "abc123");
    }

    #[test]
    fn test_copy_source_encodes_key_segments() {
        let src = ObjectPath::new(Protocol::S3, "bkt", "a b/100%+x.csv");
        assert_eq!(copy_source(&src), "bkt/a%20b/100%25%2Bx.csv");

        let plain = ObjectPath::new(Protocol::S3, "bkt", "data/y/z.csv");
        assert_eq!(copy_source(&plain), "bkt/data/y/z.csv");
    }

    struct FailingReader;

    impl AsyncRead for FailingReader {
        fn poll_read(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            _buf: &mut tokio::io::ReadBuf<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Err(std::io::Error::other("connection reset")))
        }
    }

    struct FailingWriter;

    impl AsyncWrite for FailingWriter {
        fn poll_write(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            _buf: &[u8],
        ) -> std::task::Poll<std::io::Result<usize>> {
            std::task::Poll::Ready(Err(std::io::Error::other("disk full")))
        }

        fn poll_flush(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_write_body_separates_local_and_network_failures() {
        let src = ObjectPath::new(Protocol::S3, "bkt", "data/x.csv");

        let mut out = Vec::new();
        let written = write_body(&b"payload"[..], &mut out, &src).await.unwrap();
        assert_eq!(written, 7);
        assert_eq!(out, b"payload");

        let result = write_body(&b"payload"[..], &mut FailingWriter, &src).await;
        assert!(matches!(result, Err(Error::Io(_))));

        let result = write_body(FailingReader, &mut Vec::new(), &src).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }

    #[tokio::test]
    async fn test_new_rejects_half_configured_credentials() {
        let settings = S3Settings {
            access_key: Some("key".into()),
            ..Default::default()
        };
        assert!(matches!(S3Client::new(&settings).await, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_new_with_static_credentials() {
        let settings = S3Settings {
            endpoint: Some("http://localhost:9000".into()),
            region: Some("us-east-1".into()),
            access_key: Some("key".into()),
            secret_key: Some("secret".into()),
            ..Default::default()
        };
        let client = S3Client::new(&settings).await.unwrap();
        assert_eq!(
            client.inner().config().region().map(|r| r.to_string()),
            Some("us-east-1".to_string())
        );
    }
}
