use tokio::sync::watch;

/// Counts requests in flight and publishes whether any are outstanding.
pub(crate) struct BusyIndicator {
    in_flight: watch::Sender<usize>,
}

impl BusyIndicator {
    pub(crate) fn new() -> Self {
        let (in_flight, _) = watch::channel(0);
        Self { in_flight }
    }

    /// Mark one more request as in flight until the guard drops.
    pub(crate) fn begin(&self) -> BusyGuard<'_> {
        self.in_flight.send_modify(|n| *n += 1);
        BusyGuard { indicator: self }
    }

    pub(crate) fn watch(&self) -> BusyWatch {
        BusyWatch {
            in_flight: self.in_flight.subscribe(),
        }
    }
}

pub(crate) struct BusyGuard<'a> {
    indicator: &'a BusyIndicator,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.indicator
            .in_flight
            .send_modify(|n| *n = n.saturating_sub(1));
    }
}

/// Observer for the bridge's loader indicator.
///
/// The indicator is on from the moment a request is dispatched until its
/// reply arrives, regardless of the outcome.
#[derive(Clone)]
pub struct BusyWatch {
    in_flight: watch::Receiver<usize>,
}

impl BusyWatch {
    pub fn is_busy(&self) -> bool {
        *self.in_flight.borrow() > 0
    }

    /// Wait until the indicator flips, returning the new state.
    ///
    /// Returns `None` once the bridge is gone.
    pub async fn changed(&mut self) -> Option<bool> {
        let before = self.is_busy();
        loop {
            self.in_flight.changed().await.ok()?;
            let now = *self.in_flight.borrow_and_update() > 0;
            if now != before {
                return Some(now);
            }
        }
    }
}
