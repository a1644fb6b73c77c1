//! Account window: login, registration, password reset and logout

use crate::app::state::{Slot, fill_slot, new_slot, take_slot};
use crate::entrypoints::async_runtime;
use egui::{Color32, RichText};
use manul_map_lib::auth::{self, AuthOutcome, AuthState, IdentityProvider, SessionView};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

const PROVIDER_MISSING: &str = "Вход недоступен: сервис аккаунтов не настроен.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthTab {
    #[default]
    Login,
    Register,
}

/// Shown under the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormMessage {
    pub text: &'static str,
    pub is_error: bool,
}

pub struct AuthPanel {
    state: AuthState,
    provider: Option<Arc<dyn IdentityProvider>>,
    /// Header view, kept current by the session listener
    header: Rc<RefCell<SessionView>>,
    outcome: Slot<AuthOutcome>,
    pub open: bool,
    pub tab: AuthTab,
    pub email: String,
    pub password: String,
    pub nickname: String,
    pub message: Option<FormMessage>,
    pub busy: bool,
}

impl AuthPanel {
    pub fn new(provider: Option<Arc<dyn IdentityProvider>>) -> Self {
        let header = Rc::new(RefCell::new(SessionView::default()));
        let mut state = AuthState::new();
        {
            let header = header.clone();
            state.on_session_changed(move |view| *header.borrow_mut() = view.clone());
        }
        if provider.is_none() {
            tracing::info!("No identity provider configured, accounts disabled");
        }
        Self {
            state,
            provider,
            header,
            outcome: new_slot(),
            open: false,
            tab: AuthTab::default(),
            email: String::new(),
            password: String::new(),
            nickname: String::new(),
            message: None,
            busy: false,
        }
    }

    pub fn header(&self) -> SessionView {
        self.header.borrow().clone()
    }

    fn begin(&mut self) -> Option<Arc<dyn IdentityProvider>> {
        if self.busy {
            return None;
        }
        match &self.provider {
            Some(provider) => {
                self.busy = true;
                self.message = None;
                Some(provider.clone())
            }
            None => {
                self.message = Some(FormMessage {
                    text: PROVIDER_MISSING,
                    is_error: true,
                });
                None
            }
        }
    }

    /// Submit the active tab's form
    pub fn submit(&mut self, ctx: &egui::Context) {
        let Some(provider) = self.begin() else {
            return;
        };
        let (tab, email, password, nickname) = (
            self.tab,
            self.email.clone(),
            self.password.clone(),
            self.nickname.clone(),
        );
        let slot = self.outcome.clone();
        let ctx = ctx.clone();
        async_runtime::spawn(async move {
            let outcome = match tab {
                AuthTab::Login => auth::login(provider.as_ref(), &email, &password).await,
                AuthTab::Register => auth::register(provider.as_ref(), &email, &password, &nickname).await,
            };
            fill_slot(&slot, outcome, &ctx);
        });
    }

    pub fn reset_password(&mut self, ctx: &egui::Context) {
        let Some(provider) = self.begin() else {
            return;
        };
        let email = self.email.clone();
        let slot = self.outcome.clone();
        let ctx = ctx.clone();
        async_runtime::spawn(async move {
            let outcome = auth::reset_password(provider.as_ref(), &email).await;
            fill_slot(&slot, outcome, &ctx);
        });
    }

    /// Apply a finished request; returns true if one arrived
    pub fn poll(&mut self) -> bool {
        let Some(outcome) = take_slot(&self.outcome) else {
            return false;
        };
        self.busy = false;
        self.state.apply(&outcome);
        self.message = Some(FormMessage {
            text: outcome.message(),
            is_error: outcome.is_error(),
        });
        match outcome {
            AuthOutcome::SignedIn(_) => {
                self.password.clear();
                self.open = false;
            }
            AuthOutcome::Done(_) if self.tab == AuthTab::Register => {
                // Registration ends signed out; the next step is logging in
                self.password.clear();
                self.tab = AuthTab::Login;
            }
            _ => {}
        }
        true
    }

    pub fn logout(&mut self) {
        self.state.logout();
        self.message = None;
    }

    /// Account button for the top bar
    pub fn header_ui(&mut self, ui: &mut egui::Ui) {
        let header = self.header();
        if header.shows_account() {
            ui.label(RichText::new(format!("👤 {}", header.display_name)).strong());
            if ui.small_button("Выйти").clicked() {
                self.logout();
            }
        } else if ui.button("Войти").clicked() {
            self.open = true;
        }
    }

    /// The login/registration window
    pub fn window(&mut self, ctx: &egui::Context) {
        if !self.open {
            return;
        }
        let mut open = self.open;
        egui::Window::new("Аккаунт")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.selectable_value(&mut self.tab, AuthTab::Login, "Вход");
                    ui.selectable_value(&mut self.tab, AuthTab::Register, "Регистрация");
                });
                ui.separator();

                let mut submitted = false;
                egui::Grid::new("auth_form").num_columns(2).spacing([8.0, 6.0]).show(ui, |ui| {
                    if self.tab == AuthTab::Register {
                        ui.label("Никнейм");
                        ui.text_edit_singleline(&mut self.nickname);
                        ui.end_row();
                    }
                    ui.label("Почта");
                    ui.text_edit_singleline(&mut self.email);
                    ui.end_row();
                    ui.label("Пароль");
                    let response = ui.add(egui::TextEdit::singleline(&mut self.password).password(true));
                    submitted |= response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                    ui.end_row();
                });

                ui.add_space(6.0);
                ui.horizontal(|ui| {
                    let label = match self.tab {
                        AuthTab::Login => "Войти",
                        AuthTab::Register => "Зарегистрироваться",
                    };
                    submitted |= ui.add_enabled(!self.busy, egui::Button::new(label)).clicked();
                    if self.tab == AuthTab::Login
                        && ui.add_enabled(!self.busy, egui::Button::new("Забыли пароль?").frame(false)).clicked()
                    {
                        self.reset_password(ctx);
                    }
                    if self.busy {
                        ui.spinner();
                    }
                });
                if submitted {
                    self.submit(ctx);
                }

                if let Some(message) = &self.message {
                    let color = if message.is_error {
                        Color32::from_rgb(239, 68, 68)
                    } else {
                        Color32::from_rgb(34, 197, 94)
                    };
                    ui.add_space(4.0);
                    ui.label(RichText::new(message.text).color(color));
                }
            });
        self.open = open;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use manul_map_lib::auth::{UserSession, messages};

    fn deliver(panel: &AuthPanel, outcome: AuthOutcome) {
        panel.outcome.lock().unwrap().replace(outcome);
    }

    #[test]
    fn test_no_provider_reports_inline() {
        let mut panel = AuthPanel::new(None);
        assert!(panel.begin().is_none());
        assert_eq!(panel.message.as_ref().map(|m| m.text), Some(PROVIDER_MISSING));
        assert!(!panel.busy);
    }

    #[test]
    fn test_signed_in_updates_header_and_closes() {
        let mut panel = AuthPanel::new(None);
        panel.open = true;
        panel.busy = true;
        panel.password = "secret1".into();
        assert!(!panel.header().signed_in);

        deliver(
            &panel,
            AuthOutcome::SignedIn(UserSession {
                email: Some("manul@example.org".into()),
                display_name: Some("Манул".into()),
                email_verified: true,
                ..Default::default()
            }),
        );
        assert!(panel.poll());
        assert!(!panel.open && !panel.busy);
        assert!(panel.password.is_empty());
        let header = panel.header();
        assert!(header.shows_account());
        assert_eq!(header.display_name, "Манул");
        assert_eq!(panel.message.as_ref().map(|m| m.text), Some(messages::LOGGED_IN));

        panel.logout();
        assert!(!panel.header().signed_in);
    }

    #[test]
    fn test_registration_switches_to_login() {
        let mut panel = AuthPanel::new(None);
        panel.tab = AuthTab::Register;
        deliver(&panel, AuthOutcome::Done(messages::REGISTERED));
        panel.poll();
        assert_eq!(panel.tab, AuthTab::Login);
        assert!(!panel.header().signed_in);
        assert!(!panel.message.as_ref().unwrap().is_error);
    }

    #[test]
    fn test_rejection_keeps_form() {
        let mut panel = AuthPanel::new(None);
        panel.open = true;
        panel.password = "wrong".into();
        deliver(&panel, AuthOutcome::Rejected(messages::WRONG_CREDENTIALS));
        panel.poll();
        assert!(panel.open);
        assert_eq!(panel.password, "wrong");
        assert!(panel.message.as_ref().unwrap().is_error);
        assert!(!panel.poll());
    }
}
