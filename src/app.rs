use std::path::{Path, PathBuf};
use std::sync::Arc;

use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::Paragraph;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{error, info};

use crate::Theme;
use crate::client::AdminClient;
use crate::config::{GlobalAction, KeyResolver};
use crate::download::{Downloader, HttpDownloader};
use crate::export::{ExportApi, ExportDialog, ExportDialogOptions, ExportEvent};
use crate::model::{Catalog, PolicyList};
use crate::tui::{Event, Tui};
use crate::ui::{Component, ErrorDialog, ErrorDialogEvent, EventResult, Spinner, Toast, ToastManager};

const MSG_NO_POLICY: &str = "No policy found to export";

enum AppMsg {
    CatalogLoaded(Catalog),
    CatalogFailed(String),
}

enum View {
    Loading,
    Export(ExportDialog),
    Done { path: PathBuf },
}

pub struct App {
    client: Arc<AdminClient>,
    downloader: Arc<HttpDownloader>,
    resolver: Arc<KeyResolver>,
    theme: Theme,
    fixed_type: Option<String>,
    output_dir: PathBuf,
    policies: PolicyList,
    view: View,
    spinner: Spinner,
    toasts: ToastManager,
    error: Option<ErrorDialog>,
    should_quit: bool,
    msg_tx: UnboundedSender<AppMsg>,
    msg_rx: UnboundedReceiver<AppMsg>,
}

impl App {
    pub fn new(
        client: Arc<AdminClient>,
        resolver: Arc<KeyResolver>,
        theme: Theme,
        fixed_type: Option<String>,
        output_dir: PathBuf,
    ) -> Self {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let downloader = Arc::new(HttpDownloader::new(client.credentials()));
        let mut spinner = Spinner::new();
        spinner.set_label("Loading services...");
        Self {
            client,
            downloader,
            resolver,
            theme,
            fixed_type,
            output_dir,
            policies: PolicyList::new(),
            view: View::Loading,
            spinner,
            toasts: ToastManager::default(),
            error: None,
            should_quit: false,
            msg_tx,
            msg_rx,
        }
    }

    pub async fn run(&mut self) -> color_eyre::Result<()> {
        let mut tui = Tui::new(60.0, 4.0)?;
        tui.enter()?;

        while !self.should_quit {
            let Some(event) = tui.next_event().await else {
                break;
            };
            self.handle_event(&mut tui, event)?;
        }

        tui.exit()?;
        Ok(())
    }

    fn handle_event(&mut self, tui: &mut Tui, event: Event) -> color_eyre::Result<()> {
        match event {
            Event::Init => self.fetch_catalog(),
            Event::Quit => self.should_quit = true,
            Event::Error(message) => self.report_error(message),
            Event::Tick => self.handle_tick(),
            Event::Render => {
                self.process_messages();
                self.draw(tui)?;
            }
            Event::Key(key) => {
                self.handle_key(key)?;
                self.process_messages();
            }
            Event::Resize(width, height) => {
                tui.resize(Rect::new(0, 0, width, height))?;
                self.draw(tui)?;
            }
        }
        Ok(())
    }

    fn fetch_catalog(&self) {
        let client = Arc::clone(&self.client);
        let tx = self.msg_tx.clone();
        tokio::spawn(async move {
            let msg = match client.fetch_catalog().await {
                Ok(catalog) => AppMsg::CatalogLoaded(catalog),
                Err(e) => AppMsg::CatalogFailed(e.to_string()),
            };
            let _ = tx.send(msg);
        });
    }

    fn handle_tick(&mut self) {
        self.spinner.handle_tick();
        self.toasts.handle_tick();
        if let View::Export(dialog) = &mut self.view {
            dialog.handle_tick();
        }
        self.process_messages();
    }

    fn handle_key(&mut self, key: KeyEvent) -> color_eyre::Result<()> {
        if let Some(error_dialog) = &mut self.error {
            if let EventResult::Event(ErrorDialogEvent::Dismissed) = error_dialog.handle_key(key)? {
                self.error = None;
            }
            return Ok(());
        }

        let mut pending = None;
        match &mut self.view {
            View::Export(dialog) => match dialog.handle_key(key)? {
                EventResult::Event(event) => pending = Some(event),
                EventResult::Consumed => {}
                EventResult::Ignored => {
                    if self.resolver.matches_global(&key, GlobalAction::Quit) {
                        self.should_quit = true;
                    }
                }
            },
            View::Loading | View::Done { .. } => {
                if self.resolver.matches_global(&key, GlobalAction::Quit)
                    || self.resolver.matches_global(&key, GlobalAction::Back)
                {
                    self.should_quit = true;
                }
            }
        }
        if let Some(event) = pending {
            self.apply_export_event(event);
        }
        Ok(())
    }

    fn process_messages(&mut self) {
        while let Ok(msg) = self.msg_rx.try_recv() {
            match msg {
                AppMsg::CatalogLoaded(catalog) => self.open_export_dialog(&catalog),
                AppMsg::CatalogFailed(message) => {
                    error!(message, "Could not load service catalogs");
                    self.report_error(message);
                }
            }
        }

        let events = match &mut self.view {
            View::Export(dialog) => dialog.update(),
            View::Loading | View::Done { .. } => Vec::new(),
        };
        for event in events {
            self.apply_export_event(event);
        }
    }

    fn open_export_dialog(&mut self, catalog: &Catalog) {
        info!(
            definitions = catalog.definitions.len(),
            services = catalog.services.len(),
            "Opening export dialog"
        );
        let api: Arc<dyn ExportApi> = self.client.clone();
        let downloader: Arc<dyn Downloader> = self.downloader.clone();
        self.view = View::Export(ExportDialog::new(
            catalog,
            ExportDialogOptions {
                fixed_type: self.fixed_type.clone(),
                services: None,
                output_dir: self.output_dir.clone(),
            },
            self.policies.clone(),
            api,
            downloader,
            Arc::clone(&self.resolver),
        ));
    }

    fn apply_export_event(&mut self, event: ExportEvent) {
        match event {
            ExportEvent::Cancelled => self.should_quit = true,
            ExportEvent::NoPolicies => self.toasts.show(Toast::info(MSG_NO_POLICY)),
            ExportEvent::Completed(path) => {
                self.toasts
                    .show(Toast::success(format!("Exported to {}", path.display())));
                self.view = View::Done { path };
            }
            ExportEvent::Failed(message) => self.report_error(message),
        }
    }

    fn report_error(&mut self, message: impl Into<String>) {
        self.error = Some(ErrorDialog::new(message, Arc::clone(&self.resolver)));
    }

    fn draw(&mut self, tui: &mut Tui) -> color_eyre::Result<()> {
        let theme = self.theme;
        tui.draw(|frame| {
            let area = frame.area();
            match &mut self.view {
                View::Loading => self.spinner.render(frame, area, &theme),
                View::Export(dialog) => dialog.render(frame, area, &theme),
                View::Done { path } => render_done(frame, area, &theme, path),
            }
            self.toasts.render(frame, area, &theme);
            if let Some(error_dialog) = &mut self.error {
                error_dialog.render(frame, area, &theme);
            }
        })?;
        Ok(())
    }
}

fn render_done(frame: &mut Frame, area: Rect, theme: &Theme, path: &Path) {
    let lines = vec![
        Line::styled(
            "Export complete",
            Style::default()
                .fg(theme.success())
                .add_modifier(Modifier::BOLD),
        ),
        Line::from(""),
        Line::styled(path.display().to_string(), Style::default().fg(theme.text())),
        Line::from(""),
        Line::styled("Press q to quit", Style::default().fg(theme.overlay1())),
    ];
    let popup_area = area.centered(Constraint::Percentage(60), Constraint::Length(5));
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        popup_area,
    );
}
