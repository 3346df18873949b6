// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Settings page — persistent recognition and overlay configuration.

use dioxus::prelude::*;

use snapfind_core::config::BinarizeMethod;
use snapfind_core::types::{Granularity, SegmentationMode};

use crate::services::app_services::AppServices;
use crate::state::AppState;

#[component]
pub fn Settings() -> Element {
    let mut state = use_context::<Signal<AppState>>();
    let svc = use_context::<AppServices>();
    let mut save_msg = use_signal(|| Option::<String>::None);

    rsx! {
        div {
            h1 { "Settings" }

            section { style: "margin: 16px 0;",
                h3 { "Recognition" }
                div { style: "display: flex; justify-content: space-between; align-items: center; padding: 12px 0; border-bottom: 1px solid #f0f0f0;",
                    span { "Language" }
                    input {
                        style: "width: 80px; padding: 4px 8px; border: 1px solid #ccc; border-radius: 4px; text-align: right;",
                        value: "{state.read().config.language}",
                        onchange: move |evt| {
                            let language = evt.value().trim().to_string();
                            if !language.is_empty() {
                                state.write().config.language = language;
                            }
                        },
                    }
                }
                div { style: "display: flex; justify-content: space-between; align-items: center; padding: 12px 0; border-bottom: 1px solid #f0f0f0;",
                    span { "Page layout" }
                    select {
                        style: "padding: 4px 8px; border: 1px solid #ccc; border-radius: 4px;",
                        value: segmentation_label(state.read().config.segmentation_mode),
                        onchange: move |evt| {
                            if let Some(mode) = segmentation_from_label(&evt.value()) {
                                state.write().config.segmentation_mode = mode;
                            }
                        },
                        option { value: "Auto", "Auto" }
                        option { value: "Block", "Block" }
                        option { value: "Line", "Line" }
                        option { value: "Sparse", "Sparse" }
                    }
                }
                div { style: "display: flex; justify-content: space-between; align-items: center; padding: 12px 0; border-bottom: 1px solid #f0f0f0;",
                    span { "Black & white conversion" }
                    select {
                        style: "padding: 4px 8px; border: 1px solid #ccc; border-radius: 4px;",
                        value: binarize_label(state.read().config.binarize),
                        onchange: move |evt| {
                            if let Some(method) = binarize_from_label(&evt.value()) {
                                state.write().config.binarize = method;
                            }
                        },
                        option { value: "Adaptive", "Adaptive" }
                        option { value: "Otsu", "Global (Otsu)" }
                    }
                }
                div { style: "display: flex; justify-content: space-between; align-items: center; padding: 12px 0; border-bottom: 1px solid #f0f0f0;",
                    span { "Largest image edge (px)" }
                    input {
                        r#type: "number",
                        style: "width: 80px; padding: 4px 8px; border: 1px solid #ccc; border-radius: 4px; text-align: right;",
                        value: "{state.read().config.max_recognition_dimension}",
                        onchange: move |evt| {
                            if let Ok(max) = evt.value().parse::<u32>() {
                                state.write().config.max_recognition_dimension = max;
                            }
                        },
                    }
                }
                div { style: "display: flex; justify-content: space-between; align-items: center; padding: 12px 0; border-bottom: 1px solid #f0f0f0;",
                    span { "Give up after (s)" }
                    input {
                        r#type: "number",
                        style: "width: 80px; padding: 4px 8px; border: 1px solid #ccc; border-radius: 4px; text-align: right;",
                        value: "{state.read().config.recognition_timeout_secs}",
                        onchange: move |evt| {
                            if let Ok(secs) = evt.value().parse::<u64>() {
                                state.write().config.recognition_timeout_secs = secs;
                            }
                        },
                    }
                }
            }

            section { style: "margin: 16px 0;",
                h3 { "Search" }
                div { style: "display: flex; justify-content: space-between; align-items: center; padding: 12px 0; border-bottom: 1px solid #f0f0f0;",
                    span { "Outline" }
                    select {
                        style: "padding: 4px 8px; border: 1px solid #ccc; border-radius: 4px;",
                        value: granularity_label(state.read().config.overlay_granularity),
                        onchange: move |evt| {
                            if let Some(granularity) = granularity_from_label(&evt.value()) {
                                state.write().config.overlay_granularity = granularity;
                            }
                        },
                        option { value: "Letters", "Letters" }
                        option { value: "Words", "Words" }
                        option { value: "Lines", "Lines" }
                    }
                }
                div { style: "display: flex; justify-content: space-between; align-items: center; padding: 12px 0; border-bottom: 1px solid #f0f0f0;",
                    span { "Match case" }
                    input {
                        r#type: "checkbox",
                        checked: state.read().config.case_sensitive_search,
                        onchange: move |evt| {
                            state.write().config.case_sensitive_search = evt.checked();
                        },
                    }
                }
            }

            // Save button
            button {
                style: "width: 100%; padding: 12px; border-radius: 8px; border: none; background: #007aff; color: white; font-size: 16px; margin-top: 8px;",
                onclick: {
                    let svc = svc.clone();
                    move |_| {
                        let svc = svc.clone();
                        let config = state.read().config.clone();
                        spawn(async move {
                            match svc.save_config(&config).await {
                                Ok(()) => save_msg.set(Some("Settings saved.".into())),
                                Err(e) => {
                                    tracing::error!(error = %e, "failed to save settings");
                                    save_msg.set(Some(format!("Save failed: {e}")));
                                }
                            }
                        });
                    }
                },
                "Save Settings"
            }
            if let Some(ref msg) = *save_msg.read() {
                p { style: "color: #34c759; font-size: 14px; text-align: center; margin-top: 8px;",
                    "{msg}"
                }
            }

            section { style: "margin: 24px 0;",
                h3 { "About" }
                p { style: "color: #666; font-size: 14px;",
                    "Snapfind v0.1.0"
                    br {}
                    "{svc.platform_name()}"
                    br {}
                    "Settings stored in {svc.data_dir().display()}"
                    br {}
                    "PMPL-1.0-or-later"
                }
            }
        }
    }
}

fn segmentation_label(mode: SegmentationMode) -> &'static str {
    match mode {
        SegmentationMode::Auto => "Auto",
        SegmentationMode::SingleBlock => "Block",
        SegmentationMode::SingleLine => "Line",
        SegmentationMode::SparseText => "Sparse",
    }
}

fn segmentation_from_label(label: &str) -> Option<SegmentationMode> {
    match label {
        "Auto" => Some(SegmentationMode::Auto),
        "Block" => Some(SegmentationMode::SingleBlock),
        "Line" => Some(SegmentationMode::SingleLine),
        "Sparse" => Some(SegmentationMode::SparseText),
        _ => None,
    }
}

fn binarize_label(method: BinarizeMethod) -> &'static str {
    match method {
        BinarizeMethod::Adaptive { .. } => "Adaptive",
        BinarizeMethod::Otsu => "Otsu",
    }
}

fn binarize_from_label(label: &str) -> Option<BinarizeMethod> {
    match label {
        "Adaptive" => Some(BinarizeMethod::Adaptive {
            block_radius: 15,
            offset: 10,
        }),
        "Otsu" => Some(BinarizeMethod::Otsu),
        _ => None,
    }
}

fn granularity_label(granularity: Granularity) -> &'static str {
    match granularity {
        Granularity::Symbol => "Letters",
        Granularity::Word => "Words",
        Granularity::Line => "Lines",
    }
}

fn granularity_from_label(label: &str) -> Option<Granularity> {
    match label {
        "Letters" => Some(Granularity::Symbol),
        "Words" => Some(Granularity::Word),
        "Lines" => Some(Granularity::Line),
        _ => None,
    }
}
