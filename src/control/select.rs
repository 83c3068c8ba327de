use anyhow::{Context, Result, anyhow, bail};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use super::events::{ControlEvent, RenderOptions};
use crate::media::{DeviceCatalog, MediaKind, MediaStream, label_from_stream};
use crate::preferences::PreferenceStore;
use crate::reconcile::{EntryList, UiEntry, plan_render};
use crate::system::{DeviceProvider, KeyValueStore, SubscriptionId};

struct Inner<P: DeviceProvider + 'static, S: KeyValueStore + 'static> {
    kind: MediaKind,
    catalog: DeviceCatalog<P>,
    preferences: PreferenceStore<S>,
    entries: Mutex<EntryList>,
    permission_granted: AtomicBool,
    // Single-flight guard: render passes of one control never interleave
    render_guard: tokio::sync::Mutex<()>,
    ready_tx: watch::Sender<bool>,
    events_tx: mpsc::UnboundedSender<ControlEvent>,
    events_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<ControlEvent>>,
    subscription: Mutex<Option<SubscriptionId>>,
    torn_down: AtomicBool,
}

impl<P: DeviceProvider + 'static, S: KeyValueStore + 'static> Drop for Inner<P, S> {
    fn drop(&mut self) {
        let subscription = self
            .subscription
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(id) = subscription {
            if let Err(e) = self.catalog.provider().unsubscribe(id) {
                warn!("Failed to unsubscribe dropped {} control: {}", self.kind, e);
            }
        }
    }
}

/// Device selection control bound to one media kind.
///
/// Clones share state, so one clone can drive [`DeviceSelect::run`] while
/// another serves the host.
pub struct DeviceSelect<P: DeviceProvider + 'static, S: KeyValueStore + 'static> {
    inner: Arc<Inner<P, S>>,
}

impl<P: DeviceProvider + 'static, S: KeyValueStore + 'static> Clone for DeviceSelect<P, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: DeviceProvider + 'static, S: KeyValueStore + 'static> DeviceSelect<P, S> {
    /// Create a control and subscribe it to device change notifications
    pub fn new(kind: MediaKind, provider: Arc<P>, preferences: PreferenceStore<S>) -> Result<Self> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (ready_tx, _) = watch::channel(false);

        let notify = events_tx.clone();
        let subscription = provider
            .subscribe(Box::new(move || {
                // The receiver lives as long as the control
                let _ = notify.send(ControlEvent::DevicesChanged);
            }))
            .context("Failed to subscribe to device changes")?;

        info!("Created {} device select control", kind);

        Ok(Self {
            inner: Arc::new(Inner {
                kind,
                catalog: DeviceCatalog::new(provider),
                preferences,
                entries: Mutex::new(EntryList::new()),
                permission_granted: AtomicBool::new(false),
                render_guard: tokio::sync::Mutex::new(()),
                ready_tx,
                events_tx,
                events_rx: tokio::sync::Mutex::new(events_rx),
                subscription: Mutex::new(Some(subscription)),
                torn_down: AtomicBool::new(false),
            }),
        })
    }

    /// Create a control from the host's `data-type` attribute value
    pub fn from_data_type(
        data_type: &str,
        provider: Arc<P>,
        preferences: PreferenceStore<S>,
    ) -> Result<Self> {
        let kind = data_type
            .parse::<MediaKind>()
            .with_context(|| format!("Invalid data-type attribute '{}'", data_type))?;
        Self::new(kind, provider, preferences)
    }

    pub fn kind(&self) -> MediaKind {
        self.inner.kind
    }

    pub fn preferences(&self) -> &PreferenceStore<S> {
        &self.inner.preferences
    }

    fn lock_entries(&self) -> MutexGuard<'_, EntryList> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of the entry list
    pub fn entries(&self) -> Vec<UiEntry> {
        self.lock_entries().entries().to_vec()
    }

    /// Device id of the selected entry
    pub fn value(&self) -> Option<String> {
        self.lock_entries().value().map(str::to_string)
    }

    /// Display text of the selected entry
    pub fn selected_label(&self) -> Option<String> {
        self.lock_entries().selected_text().map(str::to_string)
    }

    /// Selection revision; changes every time the selected entry changes
    pub fn selection_revision(&self) -> u64 {
        self.lock_entries().revision()
    }

    /// The permission-granted attribute as of the last completed render
    pub fn permission_granted_attr(&self) -> bool {
        self.inner.permission_granted.load(Ordering::SeqCst)
    }

    pub fn is_ready(&self) -> bool {
        *self.inner.ready_tx.borrow()
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.torn_down.load(Ordering::SeqCst)
    }

    /// Resolves once [`DeviceSelect::attach`] has finished its initial
    /// render and preference selection. There is no timeout.
    pub async fn ready(&self) {
        let mut ready = self.inner.ready_tx.subscribe();
        // Sender lives in `inner`, which outlives this borrow
        let _ = ready.wait_for(|ready| *ready).await;
    }

    /// Initial render, then the stored preference when permission is granted
    pub async fn attach(&self) -> Result<()> {
        info!("Attaching {} control", self.kind());

        self.render(RenderOptions::default()).await?;

        if self.inner.catalog.permission_granted(self.kind()).await? {
            self.set_value_from_preferences()?;
        } else {
            debug!("{} permission not granted, skipping preference", self.kind());
        }

        self.inner.ready_tx.send_replace(true);
        info!(
            "{} control ready, selected: {:?}",
            self.kind(),
            self.selected_label()
        );
        Ok(())
    }

    /// Render pass over the current entries
    pub async fn render(&self, options: RenderOptions) -> Result<()> {
        let _pass = self.inner.render_guard.lock().await;
        let previous = self.value();
        self.render_pass(previous, options, false).await?;
        Ok(())
    }

    /// Full re-render: the list is rebuilt from scratch, keeping the previous
    /// selection where it still exists, then the preference is reapplied.
    /// A hint that matched an entry wins over the stored preference.
    pub async fn re_render(&self, options: RenderOptions) -> Result<()> {
        let _pass = self.inner.render_guard.lock().await;
        let previous = self.value();
        let hint_applied = self.render_pass(previous, options, true).await?;

        if hint_applied {
            debug!("{} render hint applied, keeping it over the preference", self.kind());
        } else if self.permission_granted_attr() {
            self.set_value_from_preferences()?;
        }
        Ok(())
    }

    /// Returns whether the options' hint matched one of the rendered entries
    async fn render_pass(
        &self,
        previous: Option<String>,
        options: RenderOptions,
        rebuild: bool,
    ) -> Result<bool> {
        let kind = self.kind();
        let devices = self.inner.catalog.list_devices(kind).await?;
        let hint = options.selected.as_ref();
        let plan = plan_render(&devices, previous.as_deref(), hint);
        let hint_applied = hint.is_some_and(|hint| {
            plan.entries
                .iter()
                .any(|e| hint.matches(&e.key, &e.display_text))
        });

        {
            let mut entries = self.lock_entries();
            if rebuild {
                entries.clear();
            }
            entries.apply(&plan);
        }

        let granted = self.inner.catalog.permission_granted(kind).await?;
        self.inner.permission_granted.store(granted, Ordering::SeqCst);

        debug!(
            "Rendered {} control: {} entries, selected {:?}, permission granted: {}",
            kind,
            plan.entries.len(),
            self.value(),
            granted
        );
        Ok(hint_applied)
    }

    /// Select the entry labelled `label` unless it is already selected.
    /// Returns whether the selection changed.
    pub fn select_by_label(&self, label: &str) -> bool {
        let changed = self.lock_entries().select_by_label(label);
        if changed {
            debug!("Selected {} entry '{}'", self.kind(), label);
        }
        changed
    }

    /// Apply the stored preference, if any. Returns whether it changed the selection.
    pub fn set_value_from_preferences(&self) -> Result<bool> {
        match self.inner.preferences.load(self.kind())? {
            Some(label) => Ok(self.select_by_label(&label)),
            None => Ok(false),
        }
    }

    /// Select the device an active stream is using and persist it
    pub fn set_value_from_stream(&self, stream: &MediaStream) -> Result<()> {
        let label = label_from_stream(stream, self.kind())?;
        info!("Stream is using {} device '{}'", self.kind(), label);
        self.select_by_label(&label);
        self.persist()
    }

    /// Store the selected entry's display text as the preference
    pub fn persist(&self) -> Result<()> {
        match self.selected_label() {
            Some(label) => self.inner.preferences.save(self.kind(), &label),
            None => {
                debug!("No {} entry selected, nothing to persist", self.kind());
                Ok(())
            }
        }
    }

    /// User picked the entry `key`. A different pick is persisted before
    /// this returns, so a re-render queued behind it already sees the new
    /// preference, then announced with [`ControlEvent::SelectionChanged`].
    /// After teardown the pick only changes the list.
    pub fn choose(&self, key: &str) -> Result<()> {
        let chosen = {
            let mut entries = self.lock_entries();
            let Some(entry) = entries.get(key) else {
                bail!("No {} entry for device '{}'", self.kind(), key);
            };
            let label = entry.display_text.clone();
            let before = entries.revision();
            entries.set_selected(key, true);
            (entries.revision() != before).then_some(label)
        };

        let Some(label) = chosen else {
            return Ok(());
        };
        if self.is_torn_down() {
            debug!("{} control torn down, not persisting '{}'", self.kind(), label);
            return Ok(());
        }

        self.inner.preferences.save(self.kind(), &label)?;
        self.inner
            .events_tx
            .send(ControlEvent::SelectionChanged(label))
            .map_err(|_| anyhow!("Control event channel closed"))?;
        Ok(())
    }

    /// Handle one control event
    pub async fn handle_event(&self, event: &ControlEvent) -> Result<()> {
        match event {
            ControlEvent::DevicesChanged => {
                info!("{} devices changed, re-rendering", self.kind());
                self.re_render(RenderOptions::default()).await
            }
            ControlEvent::SelectionChanged(label) => {
                info!("User selected {} device '{}'", self.kind(), label);
                Ok(())
            }
            ControlEvent::Shutdown => Ok(()),
        }
    }

    /// Handle every queued event without waiting for new ones.
    /// Returns the number of events handled.
    pub async fn process_pending_events(&self) -> Result<usize> {
        let mut events = self.inner.events_rx.lock().await;
        let mut handled = 0;
        while let Ok(event) = events.try_recv() {
            if matches!(event, ControlEvent::Shutdown) {
                break;
            }
            self.handle_event(&event).await?;
            handled += 1;
        }
        Ok(handled)
    }

    /// Event loop: re-render on device changes until
    /// [`DeviceSelect::teardown`]. Failures are logged, not fatal.
    pub async fn run(&self) -> Result<()> {
        let mut events = self
            .inner
            .events_rx
            .try_lock()
            .map_err(|_| anyhow!("{} control event loop already running", self.kind()))?;

        info!("Entering {} control event loop", self.kind());

        while !self.is_torn_down() {
            let Some(event) = events.recv().await else {
                break;
            };
            if matches!(event, ControlEvent::Shutdown) {
                break;
            }
            if let Err(e) = self.handle_event(&event).await {
                error!("Failed to handle {:?} for {} control: {:#}", event, self.kind(), e);
            }
        }

        info!("{} control event loop exited", self.kind());
        Ok(())
    }

    /// Stop listening for device and selection changes. Safe to call
    /// repeatedly and before attach.
    pub fn teardown(&self) -> Result<()> {
        if self.inner.torn_down.swap(true, Ordering::SeqCst) {
            debug!("{} control already torn down", self.kind());
            return Ok(());
        }

        let subscription = self
            .inner
            .subscription
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(id) = subscription {
            self.inner
                .catalog
                .provider()
                .unsubscribe(id)
                .context("Failed to unsubscribe from device changes")?;
        }

        let _ = self.inner.events_tx.send(ControlEvent::Shutdown);
        info!("{} control torn down", self.kind());
        Ok(())
    }
}
