use crate::data_js;
use crate::schema::BenchmarkData;
use anyhow::Result;
use aws_sdk_s3::operation::delete_objects::DeleteObjectsOutput;
use aws_sdk_s3::types::{Delete, Object, ObjectIdentifier};
use aws_smithy_http::byte_stream::ByteStream;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub async fn client() -> aws_sdk_s3::Client {
    let aws_config = aws_config::load_from_env().await;
    aws_sdk_s3::Client::new(&aws_config)
}

pub async fn put<T>(s3: &aws_sdk_s3::Client, bucket: &str, key: &str, object: &T) -> Result<()>
where
    T: Serialize,
{
    let json = serde_json::to_string_pretty(object)?;
    put_bytes(s3, bucket, key, "application/json", json.into_bytes()).await
}

pub async fn get_from_json<T>(
    s3: &aws_sdk_s3::Client,
    bucket_name: &str,
    object_key: &str,
) -> Result<T>
where
    T: DeserializeOwned,
{
    let object = s3
        .get_object()
        .bucket(bucket_name)
        .key(object_key)
        .send()
        .await?;

    let bytes = object.body.collect().await?.into_bytes();

    let obj = serde_json::from_slice(&bytes)?;

    Ok(obj)
}

pub async fn put_data_js(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    data: &BenchmarkData,
) -> Result<()> {
    let script = data_js::render(data)?;
    put_bytes(s3, bucket, key, "application/javascript", script.into_bytes()).await
}

/// Fetches and parses `data.js`; `None` when the object does not exist yet.
pub async fn get_data_js(
    s3: &aws_sdk_s3::Client,
    bucket_name: &str,
    object_key: &str,
) -> Result<Option<BenchmarkData>> {
    let response = s3
        .get_object()
        .bucket(bucket_name)
        .key(object_key)
        .send()
        .await;

    let object = match response {
        Ok(object) => object,
        Err(e) => {
            let e = e.into_service_error();
            if e.is_no_such_key() {
                return Ok(None);
            }
            return Err(e.into());
        }
    };

    let bytes = object.body.collect().await?.into_bytes();
    let script = std::str::from_utf8(&bytes)?;

    Ok(Some(data_js::parse(script)?))
}

pub async fn list(s3: &aws_sdk_s3::Client, bucket_name: &str, prefix: &str) -> Result<Vec<Object>> {
    let mut continuation_token = None;
    let mut objects = Vec::new();

    loop {
        let mut request = s3.list_objects_v2().bucket(bucket_name).prefix(prefix);

        if let Some(token) = &continuation_token {
            request = request.continuation_token(token);
        }

        let response = request.send().await?;

        if let Some(contents) = response.contents {
            objects.extend(contents);
        }

        if response.is_truncated {
            continuation_token = response.next_continuation_token;
        } else {
            break;
        }
    }

    Ok(objects)
}

// DeleteObjects accepts at most this many keys per request.
const DELETE_BATCH: usize = 1000;

pub async fn delete_many(
    s3: &aws_sdk_s3::Client,
    bucket_name: &str,
    keys: &[String],
) -> Result<Vec<DeleteObjectsOutput>> {
    let mut responses = Vec::new();

    for batch in keys.chunks(DELETE_BATCH) {
        let delete_objects: Vec<ObjectIdentifier> = batch
            .iter()
            .map(|key| ObjectIdentifier::builder().key(key).build())
            .collect();

        let response = s3
            .delete_objects()
            .bucket(bucket_name)
            .delete(Delete::builder().set_objects(Some(delete_objects)).build())
            .send()
            .await?;
        responses.push(response);
    }

    Ok(responses)
}

async fn put_bytes(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    content_type: &str,
    bytes: Vec<u8>,
) -> Result<()> {
    s3.put_object()
        .bucket(bucket)
        .key(key)
        .content_type(content_type)
        .body(ByteStream::from(bytes))
        .send()
        .await?;

    Ok(())
}
