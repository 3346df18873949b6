// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Finder page — acquire a photo, find the text in it, search and outline the
// matches.
//
// On desktop "Choose Existing" opens a file dialog; live capture appears only
// when the platform bridge provides a camera.

use std::sync::Arc;

use dioxus::core::spawn_forever;
use dioxus::prelude::*;
use snapfind_core::error::SnapfindError;
use snapfind_core::human_errors::humanize_error;
use snapfind_pipeline::{ScreenController, SourceChoice};
use snapfind_vision::ocr::RecognitionEvent;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::services::app_services::AppServices;
use crate::state::{AppState, FindStage, FinderView};

type Controller = Arc<Mutex<ScreenController>>;

#[component]
pub fn Finder() -> Element {
    let svc = use_context::<AppServices>();
    let mut state = use_context::<Signal<AppState>>();
    let view = use_signal(FinderView::default);
    let mut query = use_signal(String::new);
    let mut options = use_signal(Vec::<SourceChoice>::new);
    let mut menu_open = use_signal(|| false);
    let mut cancel = use_signal(|| Option::<CancellationToken>::None);
    let controller = svc.controller();

    // Bring the screen up once: permissions, live session, menu entries.
    use_hook({
        let controller = controller.clone();
        move || {
            spawn(async move {
                let mut screen = controller.lock().await;
                if let Err(e) = screen.enter().await {
                    show_error(state, &e);
                }
                options.set(screen.source_options());
                drop(screen);
                refresh(controller, String::new(), view, state);
            });
        }
    });

    use_drop({
        let controller = controller.clone();
        move || {
            spawn_forever(async move {
                if let Err(e) = controller.lock().await.exit().await {
                    tracing::warn!(error = %e, "failed to stop capture session");
                }
            });
        }
    });

    let stage = state.read().stage;
    let busy = stage.is_busy();
    let current = view.read().clone();

    rsx! {
        div {
            h1 { "Snapfind" }
            p { style: "color: #666;", "Find text in a photo." }

            // Acquisition
            div { style: "display: flex; gap: 8px; margin: 16px 0;",
                button {
                    style: "flex: 1; padding: 16px; border-radius: 12px; border: 2px dashed #007aff; color: #007aff; background: white; font-size: 16px;",
                    disabled: busy,
                    onclick: move |_| menu_open.set(true),
                    "\u{1F5BC} Add Image"
                }
                if current.live_camera {
                    button {
                        style: "flex: 1; padding: 16px; border-radius: 12px; border: none; background: #007aff; color: white; font-size: 16px;",
                        disabled: busy,
                        onclick: {
                            let controller = controller.clone();
                            move |_| snap(controller.clone(), query, view, state)
                        },
                        "\u{1F4F7} Snap"
                    }
                }
            }

            // Action sheet
            if *menu_open.read() {
                div { style: "display: flex; flex-direction: column; gap: 4px; padding: 8px; border: 1px solid #e0e0e0; border-radius: 12px; background: #fafafa;",
                    for choice in options.read().iter().copied() {
                        button {
                            key: "{choice.label()}",
                            style: "padding: 12px; border-radius: 8px; border: none; background: white; font-size: 16px;",
                            onclick: {
                                let controller = controller.clone();
                                move |_| {
                                    menu_open.set(false);
                                    acquire(controller.clone(), choice, query, view, state);
                                }
                            },
                            "{choice.label()}"
                        }
                    }
                }
            }

            // Image with outlines
            if let Some(url) = current.image_url.as_ref() {
                img { src: "{url}", style: "max-width: 100%; border: 1px solid #ccc; border-radius: 4px;" }
            } else {
                p { style: "text-align: center; color: #aaa; margin: 48px 0;",
                    "No image yet."
                }
            }

            // Recognition
            div { style: "display: flex; gap: 8px; margin-top: 16px;",
                button {
                    style: "flex: 1; padding: 12px; border-radius: 8px; border: none; background: #007aff; color: white;",
                    disabled: !current.has_image || busy,
                    onclick: {
                        let controller = controller.clone();
                        move |_| find_text(controller.clone(), query, view, state, cancel)
                    },
                    "Find Text"
                }
                if busy {
                    button {
                        style: "flex: 1; padding: 12px; border-radius: 8px; border: 1px solid #ff3b30; color: #ff3b30; background: white;",
                        onclick: move |_| {
                            if let Some(token) = cancel.read().as_ref() {
                                tracing::info!("recognition cancelled by user");
                                token.cancel();
                            }
                        },
                        "Cancel"
                    }
                }
            }
            if let FindStage::Recognizing { percent } = stage {
                progress {
                    style: "width: 100%; margin-top: 8px;",
                    max: "100",
                    value: "{percent.unwrap_or(0)}",
                }
            }
            if stage != FindStage::Idle {
                p { style: "color: #666; font-size: 14px; text-align: center;", "{stage.label()}" }
            }

            // Search and text
            if let Some(text) = current.text.as_ref() {
                div { style: "margin-top: 16px;",
                    input {
                        r#type: "search",
                        placeholder: "Search recognised text",
                        style: "width: 100%; padding: 8px; border: 1px solid #ccc; border-radius: 8px;",
                        value: "{query}",
                        oninput: {
                            let controller = controller.clone();
                            move |evt: FormEvent| {
                                query.set(evt.value());
                                refresh(controller.clone(), evt.value(), view, state);
                            }
                        },
                    }
                    p { style: "color: #666; font-size: 14px;", "{current.matches} match(es)" }
                    if text.is_empty() {
                        p { style: "color: #aaa;", "No text found." }
                    } else {
                        pre { style: "white-space: pre-wrap; background: #f7f7f7; padding: 12px; border-radius: 8px;",
                            "{text}"
                        }
                    }
                }
            }

            // Error dialog
            if let Some(err) = state.read().error.clone() {
                div { style: "position: fixed; inset: 0; background: rgba(0,0,0,0.3); display: flex; align-items: center; justify-content: center;",
                    div { style: "background: white; border-radius: 12px; padding: 20px; max-width: 320px;",
                        h3 { "{err.message}" }
                        p { style: "color: #666;", "{err.suggestion}" }
                        button {
                            style: "width: 100%; padding: 10px; border-radius: 8px; border: none; background: #007aff; color: white;",
                            onclick: move |_| state.write().error = None,
                            "OK"
                        }
                    }
                }
            }
        }
    }
}

fn show_error(mut state: Signal<AppState>, err: &SnapfindError) {
    tracing::warn!(error = %err, "operation failed");
    state.write().error = Some(humanize_error(err));
}

/// Rebuild the view from the controller.
fn refresh(
    controller: Controller,
    query: String,
    mut view: Signal<FinderView>,
    state: Signal<AppState>,
) {
    spawn(async move {
        let screen = controller.lock().await;
        match FinderView::from_controller(&screen, &query) {
            Ok(next) => view.set(next),
            Err(e) => show_error(state, &e),
        }
    });
}

fn acquire(
    controller: Controller,
    choice: SourceChoice,
    query: Signal<String>,
    view: Signal<FinderView>,
    mut state: Signal<AppState>,
) {
    spawn(async move {
        let outcome = controller.lock().await.acquire(choice).await;
        match outcome {
            Ok(true) => {
                state.write().stage = FindStage::Idle;
                refresh(controller, query.read().clone(), view, state);
            }
            Ok(false) => tracing::debug!("acquisition cancelled"),
            Err(e) => show_error(state, &e),
        }
    });
}

fn snap(
    controller: Controller,
    query: Signal<String>,
    view: Signal<FinderView>,
    mut state: Signal<AppState>,
) {
    spawn(async move {
        let outcome = controller.lock().await.snap().await;
        match outcome {
            Ok(()) => {
                state.write().stage = FindStage::Idle;
                refresh(controller, query.read().clone(), view, state);
            }
            Err(e) => show_error(state, &e),
        }
    });
}

/// Run recognition outside the controller lock, streaming progress into the
/// page until the engine signals it is done.
fn find_text(
    controller: Controller,
    query: Signal<String>,
    view: Signal<FinderView>,
    mut state: Signal<AppState>,
    mut cancel: Signal<Option<CancellationToken>>,
) {
    spawn(async move {
        let started = controller.lock().await.start_recognition();
        let mut task = match started {
            Ok(task) => task,
            Err(e) => {
                show_error(state, &e);
                return;
            }
        };
        cancel.set(Some(task.cancel_token()));
        state.write().stage = FindStage::Recognizing { percent: None };

        while let Some(event) = task.next_event().await {
            match event {
                RecognitionEvent::Progress(percent) => {
                    state.write().stage = FindStage::Recognizing {
                        percent: Some(percent),
                    };
                }
                RecognitionEvent::Finished { .. } => break,
            }
        }

        let outcome = task.result().await;
        cancel.set(None);
        match outcome {
            Ok(result) => {
                let accepted = controller.lock().await.accept_result(result);
                state.write().stage = if accepted {
                    FindStage::Done
                } else {
                    FindStage::Idle
                };
                refresh(controller, query.read().clone(), view, state);
            }
            Err(SnapfindError::Cancelled) => state.write().stage = FindStage::Cancelled,
            Err(e) => {
                state.write().stage = FindStage::Failed;
                show_error(state, &e);
            }
        }
    });
}
