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

use stratus_error::{Context, Result};
use stratus_tracing::TraceContext;
use tonic::metadata::MetadataValue;
use tonic::service::Interceptor;
use tonic::transport::{Channel, ClientTlsConfig};
use tonic::{Request, Status};

/// Opens a TLS channel to `addr` (`host[:port]`), verifying against the
/// system certificate roots — the setup for calling another service on
/// the platform.
pub async fn connect(addr: &str) -> Result<Channel> {
    let tls = ClientTlsConfig::new().with_native_roots();

    Channel::from_shared(format!("https://{addr}"))
        .context("invalid endpoint address")?
        .tls_config(tls)
        .context("invalid tls configuration")?
        .connect()
        .await
        .context("failed to connect")
}

/// Interceptor attaching `authorization: Bearer <id_token>` to every
/// outgoing request. Pair with
/// [`stratus_platform::metadata::id_token`] for service-to-service auth.
pub fn auth_interceptor(id_token: &str) -> Result<impl Interceptor + Clone> {
    let token: MetadataValue<_> =
        format!("Bearer {id_token}").parse().context("id token is not valid metadata")?;

    Ok(move |mut req: Request<()>| -> std::result::Result<Request<()>, Status> {
        req.metadata_mut().insert("authorization", token.clone());
        Ok(req)
    })
}

/// Interceptor re-emitting an inbound trace context on outgoing metadata
/// so the callee's log lines land in the same trace.
pub fn trace_forward_interceptor(trace: &TraceContext) -> Result<impl Interceptor + Clone> {
    let value: MetadataValue<_> = trace.to_string().parse().context("trace context is not valid metadata")?;

    Ok(move |mut req: Request<()>| -> std::result::Result<Request<()>, Status> {
        req.metadata_mut().insert("x-cloud-trace-context", value.clone());
        Ok(req)
    })
}
