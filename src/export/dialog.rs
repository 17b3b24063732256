use std::path::PathBuf;
use std::sync::Arc;

use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Borders, Clear};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::Theme;
use crate::config::{DialogAction, KeyResolver, PickerAction};
use crate::download::{Downloader, export_file_name};
use crate::export::message::ExportMsg;
use crate::export::{ExportApi, applicable_services, services_of_type};
use crate::model::{Catalog, PolicyList, ServiceInstance};
use crate::ui::{Component, EventResult, MultiSelect, MultiSelectEvent, Result, Spinner};

const MSG_SELECT_TYPE: &str = "Select a component type";
const MSG_SELECT_SERVICE: &str = "Select at least one service";

/// Events the dialog reports to its host.
#[derive(Debug)]
pub enum ExportEvent {
    /// The operator dismissed the dialog.
    Cancelled,
    /// The existence check came back empty; nothing was downloaded.
    NoPolicies,
    /// The export file was written.
    Completed(PathBuf),
    /// A check or download failure to be reported by the shared error
    /// surface.
    Failed(String),
}

pub struct ExportDialogOptions {
    /// When set, the dialog is scoped to this single component type and the
    /// type picker is not shown.
    pub fixed_type: Option<String>,
    /// Pre-supplied service names, overriding the initial derivation for a
    /// fixed-type dialog.
    pub services: Option<Vec<String>>,
    pub output_dir: PathBuf,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Focus {
    Types,
    Services,
}

/// The export dialog.
///
/// Owns the two dependent pickers and the confirmation flow: validate, check
/// whether an export would be non-empty, and only then fetch it. Network work
/// runs in spawned tasks that report back over the dialog's message channel.
pub struct ExportDialog {
    type_picker: Option<MultiSelect>,
    service_picker: MultiSelect,
    instances: Vec<ServiceInstance>,
    policies: PolicyList,
    api: Arc<dyn ExportApi>,
    downloader: Arc<dyn Downloader>,
    output_dir: PathBuf,
    resolver: Arc<KeyResolver>,
    focus: Focus,
    /// Blocks input while the existence check is in flight. A plain flag, no
    /// queue: a second confirm during the check is simply dropped.
    busy: bool,
    downloading: bool,
    spinner: Spinner,
    type_warning: bool,
    service_warning: bool,
    msg_tx: UnboundedSender<ExportMsg>,
    msg_rx: UnboundedReceiver<ExportMsg>,
}

impl ExportDialog {
    pub fn new(
        catalog: &Catalog,
        options: ExportDialogOptions,
        policies: PolicyList,
        api: Arc<dyn ExportApi>,
        downloader: Arc<dyn Downloader>,
        resolver: Arc<KeyResolver>,
    ) -> Self {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();

        let initial_services = match (&options.fixed_type, options.services) {
            (Some(_), Some(services)) => services,
            (Some(fixed), None) => services_of_type(fixed, &catalog.services),
            (None, _) => Vec::new(),
        };

        let type_picker = if options.fixed_type.is_some() {
            None
        } else {
            let mut picker =
                MultiSelect::new("Component Type", catalog.type_names(), Arc::clone(&resolver));
            picker.set_focused(true);
            Some(picker)
        };

        let mut service_picker =
            MultiSelect::new("Service Name", initial_services, Arc::clone(&resolver));
        service_picker.set_focused(type_picker.is_none());

        let mut dialog = Self {
            focus: if type_picker.is_some() {
                Focus::Types
            } else {
                Focus::Services
            },
            type_picker,
            service_picker,
            instances: catalog.services.clone(),
            policies,
            api,
            downloader,
            output_dir: options.output_dir,
            resolver,
            busy: false,
            downloading: false,
            spinner: Spinner::new(),
            type_warning: false,
            service_warning: false,
            msg_tx,
            msg_rx,
        };

        // Initial derivation counts as a change, like any later edit.
        if dialog.type_picker.is_some() {
            dialog.recompute_services();
        }
        dialog
    }

    pub const fn busy(&self) -> bool {
        self.busy
    }

    pub const fn downloading(&self) -> bool {
        self.downloading
    }

    /// Re-derive the service picker from the currently chosen types and
    /// signal the policy collection to reset.
    fn recompute_services(&mut self) {
        let Some(type_picker) = &self.type_picker else {
            return;
        };
        let chosen_types = type_picker.selected_values();
        let names = applicable_services(&chosen_types, &self.instances);
        self.service_picker.set_options(names);
        self.policies.trigger_reset();
    }

    /// Confirmation hook, bound to the host's ok signal.
    ///
    /// Validates the current selections and, when they pass, kicks off the
    /// existence check. An empty service selection keeps the dialog open and
    /// issues no network call.
    pub fn confirm(&mut self) {
        if self.busy {
            return;
        }

        let service_names = self.service_picker.value();
        let type_is_empty = self
            .type_picker
            .as_ref()
            .is_some_and(|p| p.selected_values().is_empty());

        if type_is_empty {
            self.type_warning = true;
        }
        if service_names.is_empty() {
            self.service_warning = true;
            if !type_is_empty {
                self.type_warning = false;
            }
            return;
        }
        self.service_warning = false;
        if !type_is_empty {
            self.type_warning = false;
        }

        self.busy = true;
        self.spinner.set_label("Checking for policies...");
        tracing::info!(service_names, "Export confirmed, running existence check");

        let api = Arc::clone(&self.api);
        let tx = self.msg_tx.clone();
        tokio::spawn(async move {
            let msg = match api.check_policies_exist(&service_names).await {
                Ok(true) => ExportMsg::CheckPassed { service_names },
                Ok(false) => ExportMsg::CheckEmpty,
                Err(error) => ExportMsg::CheckFailed(error),
            };
            let _ = tx.send(msg);
        });
    }

    fn start_download(&mut self, service_names: &str) {
        let url = self.api.export_url(service_names);
        let dest = self.output_dir.join(export_file_name());
        self.downloading = true;
        tracing::info!(%url, "Policies exist, downloading export");

        let downloader = Arc::clone(&self.downloader);
        let tx = self.msg_tx.clone();
        tokio::spawn(async move {
            let msg = match downloader.fetch(&url, &dest).await {
                Ok(path) => ExportMsg::Downloaded(path),
                Err(error) => ExportMsg::DownloadFailed(error),
            };
            let _ = tx.send(msg);
        });
    }

    /// Drain queued task messages and return the resulting events.
    pub fn update(&mut self) -> Vec<ExportEvent> {
        let mut events = Vec::new();
        while let Ok(msg) = self.msg_rx.try_recv() {
            match msg {
                ExportMsg::CheckPassed { service_names } => {
                    self.busy = false;
                    self.start_download(&service_names);
                }
                ExportMsg::CheckEmpty => {
                    self.busy = false;
                    events.push(ExportEvent::NoPolicies);
                }
                ExportMsg::CheckFailed(error) => {
                    self.busy = false;
                    events.push(ExportEvent::Failed(error.to_string()));
                }
                ExportMsg::Downloaded(path) => {
                    self.downloading = false;
                    events.push(ExportEvent::Completed(path));
                }
                ExportMsg::DownloadFailed(error) => {
                    self.downloading = false;
                    events.push(ExportEvent::Failed(error.to_string()));
                }
            }
        }
        events
    }

    fn switch_focus(&mut self) {
        if self.type_picker.is_none() {
            return;
        }
        self.focus = match self.focus {
            Focus::Types => Focus::Services,
            Focus::Services => Focus::Types,
        };
        if let Some(picker) = &mut self.type_picker {
            picker.set_focused(self.focus == Focus::Types);
        }
        self.service_picker.set_focused(self.focus == Focus::Services);
    }

    fn footer_line(&self, theme: &Theme) -> Line<'static> {
        if self.downloading {
            return Line::styled("Downloading export...", Style::default().fg(theme.blue()));
        }
        let hints = format!(
            "{} toggle · {} field · {} search · {} export · {} close",
            self.resolver.display_picker(PickerAction::Toggle),
            self.resolver.display_picker(PickerAction::NextField),
            self.resolver.display_picker(PickerAction::Search),
            self.resolver.display_dialog(DialogAction::Confirm),
            self.resolver.display_dialog(DialogAction::Cancel),
        );
        Line::styled(hints, Style::default().fg(theme.overlay1()))
    }
}

impl Component for ExportDialog {
    type Output = ExportEvent;

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<Self::Output>> {
        // Blocked while the existence check runs.
        if self.busy {
            return Ok(EventResult::Consumed);
        }

        // A searching picker captures everything, including the keys the
        // dialog itself is bound to.
        let searching = match self.focus {
            Focus::Types => self.type_picker.as_ref().is_some_and(MultiSelect::is_searching),
            Focus::Services => self.service_picker.is_searching(),
        };
        if searching {
            let result = match self.focus {
                Focus::Types => match &mut self.type_picker {
                    Some(picker) => picker.handle_key(key)?,
                    None => EventResult::Ignored,
                },
                Focus::Services => self.service_picker.handle_key(key)?,
            };
            if let EventResult::Event(MultiSelectEvent::Changed(_)) = result {
                if self.focus == Focus::Types {
                    self.recompute_services();
                }
            }
            return Ok(EventResult::Consumed);
        }

        if self.resolver.matches_dialog(&key, DialogAction::Confirm) {
            self.confirm();
            return Ok(EventResult::Consumed);
        }
        if self.resolver.matches_dialog(&key, DialogAction::Cancel) {
            return Ok(ExportEvent::Cancelled.into());
        }
        if self.resolver.matches_picker(&key, PickerAction::NextField) {
            self.switch_focus();
            return Ok(EventResult::Consumed);
        }

        let result = match self.focus {
            Focus::Types => match &mut self.type_picker {
                Some(picker) => picker.handle_key(key)?,
                None => EventResult::Ignored,
            },
            Focus::Services => self.service_picker.handle_key(key)?,
        };

        match result {
            EventResult::Event(MultiSelectEvent::Changed(_)) => {
                if self.focus == Focus::Types {
                    self.recompute_services();
                }
                // Service selection changes need no handler; the value is
                // read at confirmation time.
                Ok(EventResult::Consumed)
            }
            EventResult::Consumed => Ok(EventResult::Consumed),
            EventResult::Ignored => Ok(EventResult::Ignored),
        }
    }

    fn handle_tick(&mut self) {
        if self.busy || self.downloading {
            self.spinner.handle_tick();
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let popup_area = area.centered(Constraint::Percentage(70), Constraint::Percentage(85));
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(" Export Service Policies ")
            .title_style(
                Style::default()
                    .fg(theme.mauve())
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme.border()))
            .style(Style::default().bg(theme.base()));
        let inner = block.inner(popup_area);
        frame.render_widget(block, popup_area);

        let mut constraints = Vec::new();
        if self.type_picker.is_some() {
            constraints.push(Constraint::Fill(1));
        }
        constraints.push(Constraint::Fill(2));
        constraints.push(Constraint::Length(2));
        constraints.push(Constraint::Length(1));
        let chunks = Layout::vertical(constraints).split(inner);

        let mut next = 0;
        if let Some(picker) = &mut self.type_picker {
            picker.render(frame, chunks[next], theme);
            next += 1;
        }
        self.service_picker.render(frame, chunks[next], theme);

        let warning_style = Style::default().fg(theme.warning());
        let mut warnings = Vec::new();
        if self.type_warning {
            warnings.push(Line::styled(MSG_SELECT_TYPE, warning_style));
        }
        if self.service_warning {
            warnings.push(Line::styled(MSG_SELECT_SERVICE, warning_style));
        }
        for (i, line) in warnings.into_iter().enumerate() {
            let warn_area = chunks[next + 1];
            if (i as u16) < warn_area.height {
                frame.render_widget(
                    line,
                    Rect::new(warn_area.x, warn_area.y + i as u16, warn_area.width, 1),
                );
            }
        }

        frame.render_widget(self.footer_line(theme), chunks[next + 2]);

        if self.busy {
            self.spinner.render(frame, inner, theme);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use crossterm::event::{KeyCode, KeyModifiers};

    use super::*;
    use crate::client::{ApiError, policy_export_url};
    use crate::config::keybindings::KeybindingsConfig;
    use crate::download::DownloadError;
    use crate::model::ServiceDefinition;

    const BASE: &str = "http://host/app";

    #[derive(Default)]
    struct FakeApi {
        exists: bool,
        fail: bool,
        checks: AtomicUsize,
        checked_names: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ExportApi for FakeApi {
        async fn check_policies_exist(&self, service_names: &str) -> Result<bool, ApiError> {
            self.checks.fetch_add(1, Ordering::SeqCst);
            self.checked_names
                .lock()
                .unwrap()
                .push(service_names.to_string());
            if self.fail {
                return Err(ApiError::Status {
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            Ok(self.exists)
        }

        fn export_url(&self, service_names: &str) -> String {
            policy_export_url(BASE, service_names, false)
        }
    }

    #[derive(Default)]
    struct FakeDownloader {
        fetched: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl Downloader for FakeDownloader {
        async fn fetch(&self, url: &str, dest: &Path) -> Result<PathBuf, DownloadError> {
            self.fetched.lock().unwrap().push(url.to_string());
            if self.fail {
                return Err(DownloadError::Status { status: 500 });
            }
            Ok(dest.to_path_buf())
        }
    }

    fn resolver() -> Arc<KeyResolver> {
        Arc::new(KeyResolver::new(Arc::new(KeybindingsConfig::default())))
    }

    fn catalog() -> Catalog {
        Catalog {
            definitions: vec![
                ServiceDefinition {
                    name: "HDFS".to_string(),
                },
                ServiceDefinition {
                    name: "HIVE".to_string(),
                },
            ],
            services: vec![
                ServiceInstance::new("a1", "HDFS"),
                ServiceInstance::new("a2", "HIVE"),
                ServiceInstance::new("a3", "HDFS"),
            ],
        }
    }

    fn dialog_with(
        api: Arc<FakeApi>,
        downloader: Arc<FakeDownloader>,
        fixed_type: Option<String>,
    ) -> ExportDialog {
        ExportDialog::new(
            &catalog(),
            ExportDialogOptions {
                fixed_type,
                services: None,
                output_dir: PathBuf::from("/tmp"),
            },
            PolicyList::new(),
            api,
            downloader,
            resolver(),
        )
    }

    /// Let spawned tasks run and drain their messages.
    async fn drain(dialog: &mut ExportDialog) -> Vec<ExportEvent> {
        let mut events = Vec::new();
        for _ in 0..100 {
            tokio::task::yield_now().await;
            events.extend(dialog.update());
        }
        events
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn derives_all_services_with_all_types_selected() {
        let dialog = dialog_with(Arc::default(), Arc::default(), None);
        assert_eq!(dialog.service_picker.value(), "a1,a2,a3");
        assert_eq!(dialog.policies.generation(), 1);
    }

    #[test]
    fn fixed_type_skips_the_type_picker() {
        let dialog = dialog_with(Arc::default(), Arc::default(), Some("HDFS".to_string()));
        assert!(dialog.type_picker.is_none());
        assert_eq!(dialog.service_picker.value(), "a1,a3");
        // No derivation ran, so no reset was triggered.
        assert_eq!(dialog.policies.generation(), 0);
    }

    #[test]
    fn type_change_recomputes_services_and_resets_policies() {
        let mut dialog = dialog_with(Arc::default(), Arc::default(), None);
        // Focus starts on the type picker; toggle HDFS off.
        dialog.handle_key(key(KeyCode::Char(' '))).unwrap();
        assert_eq!(dialog.service_picker.value(), "a2");
        assert_eq!(dialog.policies.generation(), 2);
    }

    #[test]
    fn escape_during_search_clears_the_filter_instead_of_cancelling() {
        let mut dialog = dialog_with(Arc::default(), Arc::default(), None);
        dialog.handle_key(key(KeyCode::Char('/'))).unwrap();
        let result = dialog.handle_key(key(KeyCode::Esc)).unwrap();
        assert!(!matches!(result, EventResult::Event(ExportEvent::Cancelled)));

        // Search mode is over, so Esc now closes the dialog.
        let result = dialog.handle_key(key(KeyCode::Esc)).unwrap();
        assert!(matches!(result, EventResult::Event(ExportEvent::Cancelled)));
    }

    #[tokio::test]
    async fn empty_service_selection_aborts_without_network() {
        let api = Arc::new(FakeApi::default());
        let mut dialog = dialog_with(Arc::clone(&api), Arc::default(), None);
        dialog.service_picker.select_none();

        dialog.confirm();
        assert!(dialog.service_warning);
        assert!(!dialog.busy());

        let events = drain(&mut dialog).await;
        assert!(events.is_empty());
        assert_eq!(api.checks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_type_selection_warns_but_continues() {
        let api = Arc::new(FakeApi {
            exists: false,
            ..FakeApi::default()
        });
        let mut dialog = dialog_with(Arc::clone(&api), Arc::default(), None);
        // Clearing the types directly leaves the service picker stale; the
        // confirmation only re-checks emptiness, on purpose.
        dialog.type_picker.as_mut().unwrap().select_none();

        dialog.confirm();
        assert!(dialog.type_warning);
        assert!(dialog.busy());

        drain(&mut dialog).await;
        assert_eq!(api.checks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn check_runs_once_and_busy_clears_on_empty_result() {
        let api = Arc::new(FakeApi {
            exists: false,
            ..FakeApi::default()
        });
        let downloader = Arc::new(FakeDownloader::default());
        let mut dialog = dialog_with(Arc::clone(&api), Arc::clone(&downloader), None);

        dialog.confirm();
        assert!(dialog.busy());

        let events = drain(&mut dialog).await;
        assert!(matches!(events.as_slice(), [ExportEvent::NoPolicies]));
        assert!(!dialog.busy());
        assert_eq!(api.checks.load(Ordering::SeqCst), 1);
        assert_eq!(
            api.checked_names.lock().unwrap().as_slice(),
            ["a1,a2,a3".to_string()]
        );
        assert!(downloader.fetched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn successful_check_downloads_with_same_names() {
        let api = Arc::new(FakeApi {
            exists: true,
            ..FakeApi::default()
        });
        let downloader = Arc::new(FakeDownloader::default());
        let mut dialog = dialog_with(Arc::clone(&api), Arc::clone(&downloader), None);

        dialog.confirm();
        let events = drain(&mut dialog).await;

        assert!(matches!(events.as_slice(), [ExportEvent::Completed(_)]));
        assert!(!dialog.busy());
        assert_eq!(
            downloader.fetched.lock().unwrap().as_slice(),
            [format!(
                "{BASE}/service/plugins/policies/exportJson?serviceName=a1,a2,a3&checkPoliciesExists=false"
            )]
        );
    }

    #[tokio::test]
    async fn export_lands_in_the_configured_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let api = Arc::new(FakeApi {
            exists: true,
            ..FakeApi::default()
        });
        let mut dialog = ExportDialog::new(
            &catalog(),
            ExportDialogOptions {
                fixed_type: None,
                services: None,
                output_dir: dir.path().to_path_buf(),
            },
            PolicyList::new(),
            api,
            Arc::new(FakeDownloader::default()),
            resolver(),
        );

        dialog.confirm();
        let events = drain(&mut dialog).await;
        let [ExportEvent::Completed(path)] = events.as_slice() else {
            panic!("expected a completion event, got {events:?}");
        };
        assert!(path.starts_with(dir.path()));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("policies-") && name.ends_with(".json"));
    }

    #[tokio::test]
    async fn check_failure_surfaces_error_and_clears_busy() {
        let api = Arc::new(FakeApi {
            fail: true,
            ..FakeApi::default()
        });
        let downloader = Arc::new(FakeDownloader::default());
        let mut dialog = dialog_with(Arc::clone(&api), Arc::clone(&downloader), None);

        dialog.confirm();
        let events = drain(&mut dialog).await;

        let [ExportEvent::Failed(message)] = events.as_slice() else {
            panic!("expected a failure event, got {events:?}");
        };
        assert!(message.contains("500"));
        assert!(!dialog.busy());
        assert!(downloader.fetched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn download_failure_is_reported() {
        let api = Arc::new(FakeApi {
            exists: true,
            ..FakeApi::default()
        });
        let downloader = Arc::new(FakeDownloader {
            fail: true,
            ..FakeDownloader::default()
        });
        let mut dialog = dialog_with(api, Arc::clone(&downloader), None);

        dialog.confirm();
        let events = drain(&mut dialog).await;
        assert!(matches!(events.as_slice(), [ExportEvent::Failed(_)]));
        assert!(!dialog.downloading());
    }

    #[tokio::test]
    async fn second_confirm_while_busy_is_dropped() {
        let api = Arc::new(FakeApi {
            exists: false,
            ..FakeApi::default()
        });
        let mut dialog = dialog_with(Arc::clone(&api), Arc::default(), None);

        dialog.confirm();
        dialog.confirm();
        drain(&mut dialog).await;
        assert_eq!(api.checks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn warning_from_earlier_attempt_clears_on_valid_confirm() {
        let api = Arc::new(FakeApi {
            exists: false,
            ..FakeApi::default()
        });
        let mut dialog = dialog_with(Arc::clone(&api), Arc::default(), None);

        dialog.service_picker.select_none();
        dialog.confirm();
        assert!(dialog.service_warning);

        dialog.service_picker.select_all();
        dialog.confirm();
        assert!(!dialog.service_warning);
        assert!(!dialog.type_warning);
        drain(&mut dialog).await;
        assert_eq!(api.checks.load(Ordering::SeqCst), 1);
    }
}
