use api_types::{DeletePodRequest, Pod, Server, UpdatePodRequest};
use chrono::{DateTime, Utc};
use ratatui::widgets::TableState;
use ratatui::Frame;
use std::time::Duration;
use task_poll::{SupervisorConfig, TaskSupervisor};

use crate::actions::Actions;
use crate::api::ApiClient;
use crate::app::Application;
use crate::logtail::LogTailTask;
use crate::poller::RefreshHandle;
use crate::scan::ScanTask;
use crate::state::DashboardState;
use crate::tui::dialog::{
    ConfirmDialog, CreateDialog, EditDialog, LogsDialogView, NoticeDialog, ScanDialogView,
};
use crate::tui::table::{PodView, ServerListView};
use crate::tui::types::{
    AppState, CreateForm, EditForm, LogsDialog, ScanDialog, ViewMode,
};

/// Interactive dashboard state: cached copies of the shared snapshot for
/// rendering, table selections, and the currently open dialog.
///
/// The shared [`DashboardState`] is read one-way in [`sync`]; every
/// mutation flows through [`Actions`] or the transient-edit setters.
///
/// [`sync`]: DashboardApp::sync
pub struct DashboardApp {
    shared: DashboardState,
    actions: Actions,
    client: ApiClient,
    refresh: RefreshHandle,
    scan_poll_interval: Duration,
    log_poll_interval: Duration,

    pub servers: Vec<Server>,
    pub selected_server: Option<Server>,
    pub last_refresh: Option<DateTime<Utc>>,
    pub last_refresh_error: Option<String>,

    pub view_mode: ViewMode,
    pub server_table: TableState,
    server_index: usize,
    pub pod_table: TableState,
    pod_index: usize,

    pub app_state: AppState,
}

impl DashboardApp {
    pub fn new(app: &Application) -> Self {
        Self {
            shared: app.state.clone(),
            actions: app.actions.clone(),
            client: app.client.clone(),
            refresh: app.refresh.clone(),
            scan_poll_interval: Duration::from_secs(app.args.scan_poll_interval_secs),
            log_poll_interval: Duration::from_secs(app.args.log_poll_interval_secs),
            servers: Vec::new(),
            selected_server: None,
            last_refresh: None,
            last_refresh_error: None,
            view_mode: ViewMode::ServerList,
            server_table: TableState::default(),
            server_index: 0,
            pod_table: TableState::default(),
            pod_index: 0,
            app_state: AppState::Normal,
        }
    }

    /// Pull the current shared snapshot and task views into the render
    /// cache. Called once per frame; the render path itself never touches
    /// shared state.
    pub async fn sync(&mut self) {
        self.servers = self.shared.servers().await;
        self.selected_server = self.shared.selected_server().await;
        self.last_refresh = self.shared.last_refresh().await;
        self.last_refresh_error = self.shared.last_refresh_error().await;
        self.clamp_selection();

        match &mut self.app_state {
            AppState::LogsDialog(dialog) => {
                dialog.view = dialog.supervisor.view().await;
            }
            AppState::ScanDialog(dialog) => {
                dialog.view = dialog.supervisor.view().await;
            }
            _ => {}
        }
    }

    fn clamp_selection(&mut self) {
        let server_count = self.servers.len();
        if server_count == 0 {
            self.server_index = 0;
            self.server_table.select(None);
        } else {
            if self.server_index >= server_count {
                self.server_index = server_count - 1;
            }
            self.server_table.select(Some(self.server_index));
        }

        let pod_count = self
            .selected_server
            .as_ref()
            .map(|server| server.pods.len())
            .unwrap_or(0);
        if pod_count == 0 {
            self.pod_index = 0;
            self.pod_table.select(None);
        } else {
            if self.pod_index >= pod_count {
                self.pod_index = pod_count - 1;
            }
            self.pod_table.select(Some(self.pod_index));
        }
    }

    pub fn next(&mut self) {
        match self.view_mode {
            ViewMode::ServerList => {
                let count = self.servers.len();
                if count > 0 {
                    self.server_index = (self.server_index + 1) % count;
                    self.server_table.select(Some(self.server_index));
                }
            }
            ViewMode::ServerDetail => {
                let count = self.pod_count();
                if count > 0 {
                    self.pod_index = (self.pod_index + 1) % count;
                    self.pod_table.select(Some(self.pod_index));
                }
            }
        }
    }

    pub fn previous(&mut self) {
        match self.view_mode {
            ViewMode::ServerList => {
                let count = self.servers.len();
                if count > 0 {
                    self.server_index = (self.server_index + count - 1) % count;
                    self.server_table.select(Some(self.server_index));
                }
            }
            ViewMode::ServerDetail => {
                let count = self.pod_count();
                if count > 0 {
                    self.pod_index = (self.pod_index + count - 1) % count;
                    self.pod_table.select(Some(self.pod_index));
                }
            }
        }
    }

    fn pod_count(&self) -> usize {
        self.selected_server
            .as_ref()
            .map(|server| server.pods.len())
            .unwrap_or(0)
    }

    /// Drill into the highlighted server. Selection is independent of the
    /// refresh cycle.
    pub async fn enter_server(&mut self) {
        if let Some(server) = self.servers.get(self.server_index) {
            self.shared.select_server(Some(server.id.clone())).await;
            self.selected_server = Some(server.clone());
            self.view_mode = ViewMode::ServerDetail;
            self.pod_index = 0;
        }
    }

    /// Back to the server list; clears the selection.
    pub async fn go_home(&mut self) {
        self.shared.select_server(None).await;
        self.selected_server = None;
        self.view_mode = ViewMode::ServerList;
    }

    pub fn selected_pod(&self) -> Option<&Pod> {
        self.selected_server
            .as_ref()
            .and_then(|server| server.pods.get(self.pod_index))
    }

    fn selected_server_id(&self) -> Option<String> {
        self.selected_server.as_ref().map(|server| server.id.clone())
    }

    /// Ask the poller for an immediate refresh.
    pub fn request_refresh(&self) {
        self.refresh.request();
    }

    pub fn open_create(&mut self) {
        if self.selected_server.is_some() {
            self.app_state = AppState::CreateDialog(CreateForm::new());
        }
    }

    /// Open the image editor for the highlighted pod, seeded with the
    /// pending edit if there is one.
    pub fn open_edit(&mut self) {
        if let Some(pod) = self.selected_pod().cloned() {
            let input = pod.editing_image.unwrap_or(pod.image_url);
            self.app_state = AppState::EditImage(EditForm {
                pod_id: pod.pod_id,
                input,
            });
        }
    }

    /// Commit the typed image as the pod's transient edit. Nothing is sent
    /// to the service; the value just survives refreshes from here on.
    pub async fn commit_edit(&mut self) {
        if let AppState::EditImage(form) = &self.app_state {
            if let Some(server_id) = self.selected_server_id() {
                self.shared
                    .set_editing_image(&server_id, &form.pod_id, form.input.clone())
                    .await;
            }
        }
        self.app_state = AppState::Normal;
    }

    /// Ask for confirmation before submitting the pending image update.
    pub fn request_update(&mut self) {
        if let Some(pod) = self.selected_pod().cloned() {
            let Some(image) = pod.editing_image.filter(|edit| !edit.is_empty()) else {
                self.app_state =
                    AppState::Notice("No pending image edit on this pod (press e to edit)".into());
                return;
            };
            if image == pod.image_url {
                self.app_state =
                    AppState::Notice("Edited image is identical to the deployed one".into());
                return;
            }
            self.app_state = AppState::ConfirmUpdate {
                pod_id: pod.pod_id,
                image,
            };
        }
    }

    pub fn request_delete(&mut self) {
        if let Some(pod) = self.selected_pod().cloned() {
            self.app_state = AppState::ConfirmDelete { pod_id: pod.pod_id };
        }
    }

    pub async fn submit_create(&mut self) {
        let AppState::CreateDialog(form) = &self.app_state else {
            return;
        };
        let Some(server_id) = self.selected_server_id() else {
            self.app_state = AppState::Normal;
            return;
        };
        let request = form.to_request(&server_id);
        if request.pod_id.is_empty() || request.image_url.is_empty() {
            self.app_state = AppState::Notice("Pod ID and image are required".into());
            return;
        }

        match self.actions.create_pod(request).await {
            Ok(()) => self.app_state = AppState::Normal,
            Err(report) => {
                self.app_state =
                    AppState::Notice(format!("Creation failed: {}", report.current_context()));
            }
        }
    }

    pub async fn submit_update(&mut self) {
        let AppState::ConfirmUpdate { pod_id, image } = &self.app_state else {
            return;
        };
        let Some(server_id) = self.selected_server_id() else {
            self.app_state = AppState::Normal;
            return;
        };
        let request = UpdatePodRequest {
            server_id,
            pod_id: pod_id.clone(),
            image_url: image.clone(),
        };

        match self.actions.update_pod(request).await {
            Ok(()) => self.app_state = AppState::Normal,
            Err(report) => {
                self.app_state =
                    AppState::Notice(format!("Update failed: {}", report.current_context()));
            }
        }
    }

    pub async fn submit_delete(&mut self) {
        let AppState::ConfirmDelete { pod_id } = &self.app_state else {
            return;
        };
        let Some(server_id) = self.selected_server_id() else {
            self.app_state = AppState::Normal;
            return;
        };
        let request = DeletePodRequest {
            server_id,
            pod_id: pod_id.clone(),
        };

        match self.actions.delete_pod(request).await {
            Ok(()) => self.app_state = AppState::Normal,
            Err(report) => {
                self.app_state =
                    AppState::Notice(format!("Delete failed: {}", report.current_context()));
            }
        }
    }

    /// Open the log tail for the highlighted pod and start polling.
    pub async fn open_logs(&mut self) {
        let Some(server_id) = self.selected_server_id() else {
            return;
        };
        let Some(pod) = self.selected_pod().cloned() else {
            return;
        };

        let task = LogTailTask::new(self.client.clone(), server_id, pod.pod_id.clone());
        let mut supervisor = TaskSupervisor::new(
            task,
            SupervisorConfig::new().with_poll_interval(self.log_poll_interval),
        );
        supervisor.begin();

        let view = supervisor.view().await;
        self.app_state = AppState::LogsDialog(LogsDialog {
            pod_id: pod.pod_id,
            supervisor,
            view,
        });
    }

    /// Start a scan of the highlighted pod's image and open its dialog.
    pub async fn open_scan(&mut self) {
        let Some(server_id) = self.selected_server_id() else {
            return;
        };
        let Some(pod) = self.selected_pod().cloned() else {
            return;
        };

        let task = ScanTask::new(self.client.clone(), server_id, pod.pod_id.clone());
        let mut supervisor = TaskSupervisor::new(
            task,
            SupervisorConfig::new().with_poll_interval(self.scan_poll_interval),
        );
        supervisor.begin();

        let view = supervisor.view().await;
        self.app_state = AppState::ScanDialog(ScanDialog {
            pod_id: pod.pod_id,
            image_url: pod.image_url,
            supervisor,
            view,
        });
    }

    /// Close whatever dialog is open. Closing a logs or scan dialog cancels
    /// its supervisor explicitly, so no poll can fire afterwards.
    pub fn close_dialog(&mut self) {
        match &self.app_state {
            AppState::LogsDialog(dialog) => dialog.supervisor.cancel(),
            AppState::ScanDialog(dialog) => dialog.supervisor.cancel(),
            _ => {}
        }
        self.app_state = AppState::Normal;
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();

        match self.view_mode {
            ViewMode::ServerList => ServerListView::render(
                &self.servers,
                &mut self.server_table,
                self.last_refresh,
                self.last_refresh_error.as_deref(),
                frame,
                area,
            ),
            ViewMode::ServerDetail => PodView::render(
                self.selected_server.as_ref(),
                &mut self.pod_table,
                frame,
                area,
            ),
        }

        match &self.app_state {
            AppState::Normal => {}
            AppState::CreateDialog(form) => CreateDialog::render(form, frame, area),
            AppState::EditImage(form) => EditDialog::render(form, frame, area),
            AppState::ConfirmUpdate { pod_id, image } => ConfirmDialog::render(
                " Confirm update ",
                &format!("Update pod {pod_id} to image {image}?"),
                frame,
                area,
            ),
            AppState::ConfirmDelete { pod_id } => ConfirmDialog::render(
                " Confirm delete ",
                &format!("Are you sure you want to delete pod {pod_id}?"),
                frame,
                area,
            ),
            AppState::LogsDialog(dialog) => LogsDialogView::render(dialog, frame, area),
            AppState::ScanDialog(dialog) => ScanDialogView::render(dialog, frame, area),
            AppState::Notice(message) => NoticeDialog::render(message, frame, area),
        }
    }
}
