// Copyright 2025 Regcache Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Regcache CLI
//!
//! Command-line runner for the cached service registry.
//!
//! - `regcache watch`: keeps a live cache against an authority and logs a
//!   summary of it until interrupted
//! - `regcache snapshot`: one full pull, printed as JSON for scripting

pub mod snapshot;
pub mod watch;

use anyhow::Result;

/// Environment variable consulted when no authority URL is given on the
/// command line.
pub const AUTHORITY_URL_ENV: &str = "REGCACHE_AUTHORITY_URL";

/// Picks the authority URL from the command-line flag, falling back to the
/// environment value, and checks it is an http(s) URL.
pub fn resolve_authority_url(flag: Option<String>, env: Option<String>) -> Result<String> {
    let url = flag.or(env).ok_or_else(|| {
        anyhow::anyhow!(
            "No authority URL given; pass one or set {}",
            AUTHORITY_URL_ENV
        )
    })?;
    regcache_common::validate_http_url(&url)?;
    Ok(url)
}
