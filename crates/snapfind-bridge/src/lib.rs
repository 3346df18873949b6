// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Snapfind — Native platform bridge abstractions.
//
// Defines the capability traits (permissions, camera hardware, image picker)
// that the pipeline drives. Native implementations for iOS and Android plug in
// by implementing `PlatformBridge`; desktop and CI builds use the stub.

use std::sync::Arc;

pub mod stub;
pub mod traits;

/// Retrieves the bridge implementation for the running platform.
pub fn platform_bridge() -> Arc<dyn traits::PlatformBridge> {
    Arc::new(stub::StubBridge)
}
