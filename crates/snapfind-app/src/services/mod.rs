// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer — bridges the Dioxus UI to the snapfind backend crates.
//
// Services wrap the pipeline in calls the UI can make directly from event
// handlers and return data it can display as-is.

pub mod app_services;
pub mod data_dir;
pub mod desktop_picker;
pub mod preview;
