//! Event polling, dispatching, and UI rendering loop.
//!
//! The loop owns the [`App`] outright. Terminal input, stream events and
//! background results all arrive on channels and are applied here, one at
//! a time, so no state is shared across tasks.

use std::{
    error::Error,
    io,
    time::{Duration, Instant},
};

use ratatui::crossterm::event::{self, Event, KeyEventKind};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::core::app::{apply_actions, App, AppAction, AppActionDispatcher};
use crate::core::providers::{StreamEnvelope, StreamEvent};
use crate::ui::renderer::ui;

use super::executors::ExecutorContext;
use super::keybindings::{route_key, route_paste};
use super::lifecycle::{restore_terminal, setup_terminal, TutorTerminal};
use super::setup::{bootstrap_app, ChatOptions};

const MAX_FPS: u64 = 60;

#[derive(Debug)]
pub enum UiEvent {
    Crossterm(Event),
}

fn spawn_event_reader(event_tx: mpsc::UnboundedSender<UiEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Ok(true) = event::poll(Duration::from_millis(10)) {
                match event::read() {
                    Ok(ev) => {
                        if event_tx.send(UiEvent::Crossterm(ev)).is_err() {
                            break;
                        }
                    }
                    Err(_) => continue,
                }
            } else {
                tokio::task::yield_now().await;
            }
        }
    })
}

fn try_draw_frame(
    app: &App,
    terminal: &mut TutorTerminal,
    request_redraw: &mut bool,
    last_draw: &mut Instant,
    frame_duration: Duration,
) -> io::Result<()> {
    if !*request_redraw {
        return Ok(());
    }

    let now = Instant::now();
    if now.duration_since(*last_draw) < frame_duration {
        return Ok(());
    }

    terminal.draw(|f| ui(f, app))?;
    *last_draw = now;
    *request_redraw = false;
    Ok(())
}

#[derive(Default)]
struct EventProcessingOutcome {
    events_processed: bool,
    exit_requested: bool,
}

fn process_ui_events(
    app: &mut App,
    executor: &ExecutorContext,
    event_rx: &mut mpsc::UnboundedReceiver<UiEvent>,
) -> EventProcessingOutcome {
    let mut outcome = EventProcessingOutcome::default();

    while let Ok(ev) = event_rx.try_recv() {
        outcome.events_processed = true;
        match ev {
            UiEvent::Crossterm(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                let key_outcome = route_key(app, key);
                executor.execute_all(app, key_outcome.commands);
                if key_outcome.exit {
                    outcome.exit_requested = true;
                    break;
                }
            }
            UiEvent::Crossterm(Event::Paste(text)) => route_paste(app, &text),
            UiEvent::Crossterm(_) => {}
        }
    }

    outcome
}

/// Turn raw stream events into actions, merging consecutive chunks so a
/// burst between frames costs one append.
fn collect_stream_actions(rx: &mut mpsc::UnboundedReceiver<StreamEnvelope>) -> Vec<AppAction> {
    let mut actions = Vec::new();
    let mut pending_chunk: Option<(String, uuid::Uuid)> = None;

    while let Ok((event, stream_id)) = rx.try_recv() {
        match event {
            StreamEvent::Chunk(content) => match pending_chunk.as_mut() {
                Some((buffer, id)) if *id == stream_id => buffer.push_str(&content),
                _ => {
                    if let Some((content, stream_id)) = pending_chunk.take() {
                        actions.push(AppAction::AppendResponseChunk { content, stream_id });
                    }
                    pending_chunk = Some((content, stream_id));
                }
            },
            StreamEvent::Completed(content) => {
                if let Some((content, stream_id)) = pending_chunk.take() {
                    actions.push(AppAction::AppendResponseChunk { content, stream_id });
                }
                actions.push(AppAction::StreamCompleted { content, stream_id });
            }
            StreamEvent::Errored(message) => {
                if let Some((content, stream_id)) = pending_chunk.take() {
                    actions.push(AppAction::AppendResponseChunk { content, stream_id });
                }
                actions.push(AppAction::StreamErrored { message, stream_id });
            }
        }
    }

    if let Some((content, stream_id)) = pending_chunk.take() {
        actions.push(AppAction::AppendResponseChunk { content, stream_id });
    }
    actions
}

fn process_stream_updates(
    app: &mut App,
    executor: &ExecutorContext,
    rx: &mut mpsc::UnboundedReceiver<StreamEnvelope>,
) -> bool {
    let actions = collect_stream_actions(rx);
    if actions.is_empty() {
        return false;
    }
    let commands = apply_actions(app, actions);
    executor.execute_all(app, commands);
    true
}

fn drain_action_queue(
    app: &mut App,
    executor: &ExecutorContext,
    action_rx: &mut mpsc::UnboundedReceiver<AppAction>,
) -> bool {
    let mut pending = Vec::new();
    while let Ok(action) = action_rx.try_recv() {
        pending.push(action);
    }
    if pending.is_empty() {
        return false;
    }

    let commands = apply_actions(app, pending);
    executor.execute_all(app, commands);
    true
}

pub async fn run_chat(options: ChatOptions) -> Result<(), Box<dyn Error>> {
    let (mut app, provider) = bootstrap_app(options)?;

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<AppAction>();
    let (stream_tx, mut stream_rx) = mpsc::unbounded_channel::<StreamEnvelope>();
    let executor = ExecutorContext::new(provider, AppActionDispatcher::new(action_tx), stream_tx);

    let mut terminal = setup_terminal()?;

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<UiEvent>();
    let event_reader_handle = spawn_event_reader(event_tx);

    let frame_duration = Duration::from_millis(1000 / MAX_FPS);
    let mut last_draw = Instant::now() - frame_duration;
    let mut request_redraw = true;
    let mut was_streaming = false;

    let result = 'main_loop: loop {
        if app.ui.exit_requested {
            break 'main_loop Ok(());
        }

        if let Err(err) = try_draw_frame(
            &app,
            &mut terminal,
            &mut request_redraw,
            &mut last_draw,
            frame_duration,
        ) {
            break 'main_loop Err(Box::new(err) as Box<dyn Error>);
        }

        let event_outcome = process_ui_events(&mut app, &executor, &mut event_rx);
        if event_outcome.exit_requested {
            break 'main_loop Ok(());
        }

        let received_any = process_stream_updates(&mut app, &executor, &mut stream_rx);
        let actions_applied = drain_action_queue(&mut app, &executor, &mut action_rx);

        // Keep the thinking indicator animating while a reply streams.
        let streaming = app.streaming.is_streaming || app.ui.is_thinking();
        if streaming != was_streaming {
            debug!(streaming, "activity changed");
            was_streaming = streaming;
        }

        if event_outcome.events_processed || received_any || actions_applied || streaming {
            request_redraw = true;
        }

        let idle = !event_outcome.events_processed && !received_any && !actions_applied;
        if idle {
            tokio::time::sleep(Duration::from_millis(16)).await;
        }
    };

    if let Some(controller) = app.streaming.controller.as_ref() {
        controller.abort();
    }
    event_reader_handle.abort();
    restore_terminal(&mut terminal)?;
    info!("tutor exited");

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Role;
    use crate::utils::test_utils::create_test_app;
    use uuid::Uuid;

    fn executor() -> (ExecutorContext, mpsc::UnboundedReceiver<AppAction>) {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let (stream_tx, _stream_rx) = mpsc::unbounded_channel();
        (
            ExecutorContext::new(None, AppActionDispatcher::new(action_tx), stream_tx),
            action_rx,
        )
    }

    #[test]
    fn consecutive_chunks_are_coalesced() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        tx.send((StreamEvent::Chunk("Hel".into()), id)).unwrap();
        tx.send((StreamEvent::Chunk("lo".into()), id)).unwrap();
        tx.send((StreamEvent::Completed("Hello".into()), id)).unwrap();

        let actions = collect_stream_actions(&mut rx);
        assert_eq!(actions.len(), 2);
        assert!(matches!(
            &actions[0],
            AppAction::AppendResponseChunk { content, stream_id } if content == "Hello" && *stream_id == id
        ));
        assert!(matches!(
            &actions[1],
            AppAction::StreamCompleted { content, .. } if content == "Hello"
        ));
    }

    #[test]
    fn chunks_from_different_streams_stay_separate() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let old = Uuid::new_v4();
        let new = Uuid::new_v4();
        tx.send((StreamEvent::Chunk("stale".into()), old)).unwrap();
        tx.send((StreamEvent::Chunk("fresh".into()), new)).unwrap();

        let actions = collect_stream_actions(&mut rx);
        assert_eq!(actions.len(), 2);
        assert!(matches!(
            &actions[1],
            AppAction::AppendResponseChunk { stream_id, .. } if *stream_id == new
        ));
    }

    #[test]
    fn stream_updates_finish_the_reply() {
        let mut app = create_test_app();
        let Some(crate::core::app::AppCommand::SpawnStream(request)) = crate::core::app::apply_action(
            &mut app,
            AppAction::SubmitMessage {
                message: "hello".into(),
            },
        ) else {
            panic!("expected a stream request");
        };
        let (executor, _actions) = executor();
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send((StreamEvent::Chunk("Hi".into()), request.stream_id))
            .unwrap();
        tx.send((StreamEvent::Completed("Hi!".into()), request.stream_id))
            .unwrap();

        assert!(process_stream_updates(&mut app, &executor, &mut rx));
        assert!(!app.streaming.is_streaming);
        let reply = app.session.history.last().unwrap();
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.content, "Hi!");
        assert!(!process_stream_updates(&mut app, &executor, &mut rx));
    }

    #[test]
    fn queued_actions_are_applied_in_order() {
        let mut app = create_test_app();
        let (executor, _actions) = executor();
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(AppAction::SetStatus {
            message: "first".into(),
            is_error: false,
        })
        .unwrap();
        tx.send(AppAction::SetStatus {
            message: "second".into(),
            is_error: true,
        })
        .unwrap();

        assert!(drain_action_queue(&mut app, &executor, &mut rx));
        assert_eq!(app.ui.status_message.as_deref(), Some("second"));
        assert!(!drain_action_queue(&mut app, &executor, &mut rx));
    }
}
