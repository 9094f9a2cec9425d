//! Screen reachability derived from the session.
//!
//! Unauthenticated sessions may only reach the auth screens; authenticated
//! sessions only the dossier screens. Nothing is reachable while loading.

use serde::{Deserialize, Serialize};

use crate::session::SessionState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "screen", rename_all = "camelCase")]
pub enum Route {
    Home,
    Login,
    Register,
    Recuperation,
    DossierList,
    DossierDetail { dossier_id: String },
    PdfViewer { name: String, url: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenGroup {
    /// Spinner while the provider resolves.
    Loading,
    Auth,
    Dossiers,
}

impl ScreenGroup {
    pub fn for_state(state: &SessionState) -> Self {
        match state {
            SessionState::Loading => ScreenGroup::Loading,
            SessionState::Anonymous => ScreenGroup::Auth,
            SessionState::Authenticated(_) => ScreenGroup::Dossiers,
        }
    }
}

impl Route {
    pub fn group(&self) -> ScreenGroup {
        match self {
            Route::Home | Route::Login | Route::Register | Route::Recuperation => ScreenGroup::Auth,
            Route::DossierList | Route::DossierDetail { .. } | Route::PdfViewer { .. } => {
                ScreenGroup::Dossiers
            }
        }
    }
}

pub fn initial_route(state: &SessionState) -> Option<Route> {
    match ScreenGroup::for_state(state) {
        ScreenGroup::Loading => None,
        ScreenGroup::Auth => Some(Route::Home),
        ScreenGroup::Dossiers => Some(Route::DossierList),
    }
}

pub fn is_reachable(route: &Route, state: &SessionState) -> bool {
    route.group() == ScreenGroup::for_state(state)
}

/// Where to go when `route` stops being reachable after a session change.
///
/// Returns `None` when the current route is still valid.
pub fn redirect_for(route: &Route, state: &SessionState) -> Option<Route> {
    if is_reachable(route, state) {
        None
    } else {
        initial_route(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::User;

    fn signed_in() -> SessionState {
        SessionState::Authenticated(User {
            id: "u1".to_string(),
            email: "u1@example.com".to_string(),
            display_name: None,
            first_name: String::new(),
            last_name: String::new(),
            phone: String::new(),
            address: String::new(),
            city: String::new(),
            postal_code: String::new(),
            has_profile: true,
        })
    }

    #[test]
    fn test_initial_routes() {
        assert_eq!(initial_route(&SessionState::Loading), None);
        assert_eq!(initial_route(&SessionState::Anonymous), Some(Route::Home));
        assert_eq!(initial_route(&signed_in()), Some(Route::DossierList));
    }

    #[test]
    fn test_reachability() {
        let detail = Route::DossierDetail {
            dossier_id: "DOS-1".to_string(),
        };
        assert!(is_reachable(&detail, &signed_in()));
        assert!(!is_reachable(&detail, &SessionState::Anonymous));
        assert!(!is_reachable(&Route::Login, &signed_in()));
        assert!(!is_reachable(&Route::Login, &SessionState::Loading));
    }

    #[test]
    fn test_redirect_on_logout() {
        assert_eq!(
            redirect_for(&Route::DossierList, &SessionState::Anonymous),
            Some(Route::Home)
        );
        assert_eq!(redirect_for(&Route::Login, &SessionState::Anonymous), None);
        assert_eq!(redirect_for(&Route::Login, &signed_in()), Some(Route::DossierList));
    }

    #[test]
    fn test_route_serde_keeps_fields() {
        let viewer = Route::PdfViewer {
            name: "Constat amiable".to_string(),
            url: "https://example.com/constat.pdf".to_string(),
        };
        let value = serde_json::to_value(&viewer).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "screen": "pdfViewer",
                "name": "Constat amiable",
                "url": "https://example.com/constat.pdf",
            })
        );
        assert_eq!(serde_json::from_value::<Route>(value).unwrap(), viewer);

        let detail = Route::DossierDetail {
            dossier_id: "DOS-1".to_string(),
        };
        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["screen"], "dossierDetail");
        assert_eq!(serde_json::from_value::<Route>(value).unwrap(), detail);

        let home = serde_json::to_value(Route::Home).unwrap();
        assert_eq!(home, serde_json::json!({ "screen": "home" }));
    }
}
