// Copyright 2025 The stratus Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Lookups against the platform metadata server.

use bytes::Bytes;
use http::{Method, Request};
use http_body_util::{BodyExt, Empty};
use hyper_util::{client::legacy::Client, rt::TokioExecutor};
use stratus_error::{Context, Result};

const METADATA_HOST: &str = "metadata.google.internal";
const PROJECT_ID_PATH: &str = "/computeMetadata/v1/project/project-id";
const IDENTITY_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/identity";
const METADATA_FLAVOR: &str = "Metadata-Flavor";

/// Resolves the project id. `GOOGLE_CLOUD_PROJECT` wins when set so local
/// runs never touch the metadata server.
pub async fn project_id() -> Result<String> {
    if let Some(project_id) = crate::non_empty_env("GOOGLE_CLOUD_PROJECT") {
        return Ok(project_id);
    }

    fetch(format!("http://{METADATA_HOST}{PROJECT_ID_PATH}")).await.context("failed to fetch project id")
}

/// Fetches an identity token for calling another service on the platform.
/// `addr` is a `host[:port]` pair; the audience is the https URL of the host.
pub async fn id_token(addr: &str) -> Result<String> {
    let host = addr.split(':').next().unwrap_or(addr);
    let uri = format!("http://{METADATA_HOST}{IDENTITY_PATH}?audience=https://{host}");

    fetch(uri).await.context("failed to fetch identity token")
}

async fn fetch(uri: String) -> Result<String> {
    let client: Client<_, Empty<Bytes>> = Client::builder(TokioExecutor::new()).build_http();

    let request = Request::builder().method(Method::GET).uri(uri).header(METADATA_FLAVOR, "Google").body(Empty::new())?;

    let response = client.request(request).await?;
    if !response.status().is_success() {
        return Err(format!("metadata server replied with status {}", response.status()).into());
    }

    let body = response.into_body().collect().await?.to_bytes();
    Ok(String::from_utf8(body.to_vec())?)
}
