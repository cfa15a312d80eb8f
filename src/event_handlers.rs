/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

use crate::events::*;
use crate::logging::Logger;

pub(crate) type HandlerPtr<T> = Box<dyn Fn(&T) + Send + Sync>;

/// The handlers registered for each kind of [`Event`]. The default logger of an event, if logging is
/// enabled, runs before the user's handler.
pub(crate) struct EventHandlers {
    pub(crate) start_run_handlers: Vec<HandlerPtr<StartRunEvent>>,
    pub(crate) complete_turn_handlers: Vec<HandlerPtr<CompleteTurnEvent>>,
    pub(crate) pause_handlers: Vec<HandlerPtr<PauseEvent>>,
    pub(crate) resume_handlers: Vec<HandlerPtr<ResumeEvent>>,
    pub(crate) reset_handlers: Vec<HandlerPtr<ResetEvent>>,
    pub(crate) finish_run_handlers: Vec<HandlerPtr<FinishRunEvent>>,
    pub(crate) shut_down_handlers: Vec<HandlerPtr<ShutDownEvent>>,
}

impl EventHandlers {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        log_events: bool,
        on_start_run: Option<HandlerPtr<StartRunEvent>>,
        on_complete_turn: Option<HandlerPtr<CompleteTurnEvent>>,
        on_pause: Option<HandlerPtr<PauseEvent>>,
        on_resume: Option<HandlerPtr<ResumeEvent>>,
        on_reset: Option<HandlerPtr<ResetEvent>>,
        on_finish_run: Option<HandlerPtr<FinishRunEvent>>,
        on_shut_down: Option<HandlerPtr<ShutDownEvent>>,
    ) -> EventHandlers {
        EventHandlers {
            start_run_handlers: handlers(log_events, on_start_run),
            complete_turn_handlers: handlers(log_events, on_complete_turn),
            pause_handlers: handlers(log_events, on_pause),
            resume_handlers: handlers(log_events, on_resume),
            reset_handlers: handlers(log_events, on_reset),
            finish_run_handlers: handlers(log_events, on_finish_run),
            shut_down_handlers: handlers(log_events, on_shut_down),
        }
    }

    pub(crate) fn fire_handlers(&self, event: Event) {
        match event {
            Event::StartRun(start_run_event) => self
                .start_run_handlers
                .iter()
                .for_each(|handler| handler(&start_run_event)),

            Event::CompleteTurn(complete_turn_event) => self
                .complete_turn_handlers
                .iter()
                .for_each(|handler| handler(&complete_turn_event)),

            Event::Pause(pause_event) => self.pause_handlers.iter().for_each(|handler| handler(&pause_event)),

            Event::Resume(resume_event) => self.resume_handlers.iter().for_each(|handler| handler(&resume_event)),

            Event::Reset(reset_event) => self.reset_handlers.iter().for_each(|handler| handler(&reset_event)),

            Event::FinishRun(finish_run_event) => self
                .finish_run_handlers
                .iter()
                .for_each(|handler| handler(&finish_run_event)),

            Event::ShutDown(shut_down_event) => self
                .shut_down_handlers
                .iter()
                .for_each(|handler| handler(&shut_down_event)),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.start_run_handlers.is_empty()
            && self.complete_turn_handlers.is_empty()
            && self.pause_handlers.is_empty()
            && self.resume_handlers.is_empty()
            && self.reset_handlers.is_empty()
            && self.finish_run_handlers.is_empty()
            && self.shut_down_handlers.is_empty()
    }
}

fn handlers<T: Logger>(log_events: bool, user_handler: Option<HandlerPtr<T>>) -> Vec<HandlerPtr<T>> {
    let mut handlers = Vec::new();
    if log_events {
        handlers.push(T::get_logger());
    }
    if let Some(handler) = user_handler {
        handlers.push(handler);
    }
    handlers
}
