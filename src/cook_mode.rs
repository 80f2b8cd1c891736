//! # Cook Mode
//!
//! One-step-at-a-time walkthrough of a recipe's steps with an optional
//! countdown per step. The session only tracks state; the caller drives the
//! clock by calling [`CookSession::tick`] once per second.

use crate::recipe_model::{Recipe, Step};

/// What happened after a navigation or clock event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookEvent {
    /// Now showing the step at this index
    Moved(usize),
    /// The last step was confirmed
    Finished,
    /// Navigation not possible from here
    Ignored,
    /// Countdown still running with this many seconds left
    TimerRunning(u64),
    /// Countdown reached zero and was cleared
    TimerFinished,
}

/// Cook-mode state for one recipe
#[derive(Debug, Clone)]
pub struct CookSession<'a> {
    recipe: &'a Recipe,
    current: usize,
    timer: Option<u64>,
    finished: bool,
}

impl<'a> CookSession<'a> {
    /// Start at the first step; returns `None` for a recipe with no steps
    pub fn start(recipe: &'a Recipe) -> Option<Self> {
        if !recipe.has_steps() {
            return None;
        }
        Some(Self {
            recipe,
            current: 0,
            timer: None,
            finished: false,
        })
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_step(&self) -> &'a Step {
        &self.recipe.steps[self.current]
    }

    pub fn step_count(&self) -> usize {
        self.recipe.steps.len()
    }

    pub fn is_last_step(&self) -> bool {
        self.current + 1 == self.step_count()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn can_go_back(&self) -> bool {
        self.current > 0 && !self.finished
    }

    /// Progress label, e.g. "2/5"
    pub fn progress(&self) -> String {
        format!("{}/{}", self.current + 1, self.step_count())
    }

    /// Advance; on the last step this finishes the session
    pub fn next(&mut self) -> CookEvent {
        if self.finished {
            return CookEvent::Ignored;
        }
        if self.is_last_step() {
            self.finished = true;
            self.timer = None;
            return CookEvent::Finished;
        }
        self.current += 1;
        self.timer = None;
        CookEvent::Moved(self.current)
    }

    pub fn previous(&mut self) -> CookEvent {
        if !self.can_go_back() {
            return CookEvent::Ignored;
        }
        self.current -= 1;
        self.timer = None;
        CookEvent::Moved(self.current)
    }

    /// Start the current step's countdown, if it has one
    pub fn start_timer(&mut self) -> Option<u64> {
        let seconds = self.current_step().timer_duration_secs()?;
        self.timer = Some(seconds);
        Some(seconds)
    }

    pub fn remaining(&self) -> Option<u64> {
        self.timer
    }

    /// Advance the countdown by one second
    pub fn tick(&mut self) -> CookEvent {
        match self.timer {
            None => CookEvent::Ignored,
            Some(remaining) if remaining <= 1 => {
                self.timer = None;
                CookEvent::TimerFinished
            }
            Some(remaining) => {
                self.timer = Some(remaining - 1);
                CookEvent::TimerRunning(remaining - 1)
            }
        }
    }
}

/// Format seconds as `m:ss`
pub fn format_countdown(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
