//! Post enumeration against the platform's API
//!
//! These loaders only list posts; archiving them is up to the caller. All
//! requests go through the fetch coordinator so they share its headers and
//! request delay.

pub mod liked;
pub mod project_posts;
pub mod single_post;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::resources::{FetchCoordinator, ResourceError, ResourceResult};
use crate::utils::PRIMARY_ORIGIN;

pub use liked::load_all_liked_posts;
pub use project_posts::load_all_project_posts;
pub use single_post::{SinglePost, load_single_post, parse_post_url};

#[derive(Deserialize)]
enum TrpcResponse<T> {
    #[serde(rename = "result")]
    Result { data: T },
    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        message: String,
        #[serde(default)]
        code: Option<i64>,
    },
}

/// URL of a tRPC query, with its input serialized into the query string
pub fn trpc_url<A: serde::Serialize>(query: &str, input: &A) -> ResourceResult<String> {
    let mut url = Url::parse(&format!("{PRIMARY_ORIGIN}/api/v1/trpc/{query}")).map_err(|e| {
        ResourceError::InvalidUrl {
            url: query.to_string(),
            message: e.to_string(),
        }
    })?;
    url.query_pairs_mut()
        .append_pair("input", &serde_json::to_string(input)?);
    Ok(url.to_string())
}

/// Run a tRPC query and unwrap its `result.data`
pub(crate) async fn trpc_query<A, T>(coordinator: &FetchCoordinator, query: &str, input: &A) -> ResourceResult<T>
where
    A: serde::Serialize,
    T: DeserializeOwned,
{
    let url = trpc_url(query, input)?;
    let response = coordinator.get(&url).await?;
    match serde_json::from_slice::<TrpcResponse<T>>(&response.body)? {
        TrpcResponse::Result { data } => Ok(data),
        TrpcResponse::Error { message, code } => Err(ResourceError::Api {
            query: query.to_string(),
            message: match code {
                Some(code) => format!("{code}: {message}"),
                None => message,
            },
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_input_is_encoded_as_json() {
        let url = trpc_url("posts.singlePost", &json!({ "handle": "eggbug", "postId": 1 }))
            .expect("valid url");
        let parsed = Url::parse(&url).expect("parses");
        assert_eq!(parsed.path(), "/api/v1/trpc/posts.singlePost");
        let input = parsed
            .query_pairs()
            .find(|(k, _)| k == "input")
            .map(|(_, v)| v.into_owned())
            .expect("has input");
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&input).expect("json"),
            json!({ "handle": "eggbug", "postId": 1 })
        );
    }

    #[test]
    fn error_responses_are_recognized() {
        let parsed: TrpcResponse<serde_json::Value> =
            serde_json::from_value(json!({ "error": { "message": "NOT_FOUND", "code": -32004 } }))
                .expect("valid");
        assert!(matches!(parsed, TrpcResponse::Error { .. }));
    }
}
