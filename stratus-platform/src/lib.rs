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

//! Detection of the managed platform and access to its metadata surface.

pub mod metadata;
pub mod signal;

pub(crate) fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Whether the process runs on Cloud Run. There is no dedicated marker,
/// so this relies on the env vars injected by the container contract.
/// `K_SERVICE` and `K_REVISION` are also set by Cloud Functions, which
/// leaves the configuration name as the only reliable signal.
pub fn is_cloud_run() -> bool {
    non_empty_env("K_CONFIGURATION").is_some()
}

/// Name of the service owning this container, when injected.
pub fn service_name() -> Option<String> {
    non_empty_env("K_SERVICE")
}

/// Revision the container was deployed as, when injected.
pub fn revision() -> Option<String> {
    non_empty_env("K_REVISION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    // Env vars are process-wide; hold this across every test that touches them.
    pub(crate) static ENV_GUARD: Mutex<()> = Mutex::new(());

    #[test]
    fn cloud_run_detection_follows_configuration_var() {
        let _guard = ENV_GUARD.lock();

        std::env::remove_var("K_CONFIGURATION");
        assert!(!is_cloud_run());

        std::env::set_var("K_CONFIGURATION", "");
        assert!(!is_cloud_run());

        std::env::set_var("K_CONFIGURATION", "my-service");
        assert!(is_cloud_run());

        std::env::remove_var("K_CONFIGURATION");
    }

    #[test]
    fn container_contract_accessors() {
        let _guard = ENV_GUARD.lock();

        std::env::remove_var("K_SERVICE");
        std::env::remove_var("K_REVISION");
        assert_eq!(service_name(), None);
        assert_eq!(revision(), None);

        std::env::set_var("K_SERVICE", "frontend");
        std::env::set_var("K_REVISION", "frontend-00042-abc");
        assert_eq!(service_name().as_deref(), Some("frontend"));
        assert_eq!(revision().as_deref(), Some("frontend-00042-abc"));

        std::env::remove_var("K_SERVICE");
        std::env::remove_var("K_REVISION");
    }
}
