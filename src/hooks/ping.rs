//! Periodically re-trigger a call.
//!
//! A [`Ping`] calls its trigger immediately, then every `interval`, as long as
//! its condition holds. Changing the arguments, interval or condition resets
//! the cycle. Stopping or dropping the ping cancels the timer.

use log::debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

type TriggerFn<A> = Arc<dyn Fn(A) + Send + Sync>;

/// Inputs of a [`Ping`]. Any change restarts the cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct PingParams<A> {
    /// Arguments passed to every call.
    pub args: A,
    /// Delay between calls. Zero calls once and schedules nothing.
    pub interval: Duration,
    /// Calls only happen while this is true.
    pub condition: bool,
}

impl<A> PingParams<A> {
    pub fn new(args: A, interval: Duration) -> Self {
        Self {
            args,
            interval,
            condition: true,
        }
    }

    pub fn condition(mut self, condition: bool) -> Self {
        self.condition = condition;
        self
    }
}

/// Calls a trigger periodically on a Tokio timer.
pub struct Ping<A> {
    call: TriggerFn<A>,
    params: PingParams<A>,
    timer: Option<JoinHandle<()>>,
}

impl<A> Ping<A>
where
    A: Clone + PartialEq + Send + Sync + 'static,
{
    /// Starts pinging. The first call happens before this returns.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<F>(call: F, params: PingParams<A>) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        let mut ping = Self {
            call: Arc::new(call),
            params,
            timer: None,
        };
        ping.schedule();
        ping
    }

    pub fn params(&self) -> &PingParams<A> {
        &self.params
    }

    /// Whether a timer is currently scheduled.
    pub fn is_scheduled(&self) -> bool {
        self.timer.as_ref().map_or(false, |timer| !timer.is_finished())
    }

    /// Replaces the inputs. If anything changed, the timer is reset and,
    /// when the condition holds, a call happens immediately.
    pub fn update(&mut self, params: PingParams<A>) {
        if params == self.params {
            return;
        }

        self.params = params;
        self.schedule();
    }

    /// Cancels the timer. No call happens afterwards until the next `update`
    /// with changed inputs.
    pub fn stop(&mut self) {
        self.cancel();
    }

    fn schedule(&mut self) {
        self.cancel();

        if !self.params.condition {
            return;
        }

        (self.call)(self.params.args.clone());

        let period = self.params.interval;
        if period.is_zero() {
            return;
        }

        debug!("Scheduling ping every {:?}", period);

        let call = Arc::clone(&self.call);
        let args = self.params.args.clone();
        self.timer = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                call(args.clone());
            }
        }));
    }

    fn cancel(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl<A> Drop for Ping<A> {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}
