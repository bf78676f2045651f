//! Admin panel: user approval management.

use axum::extract::State;
use axum::response::{Html, IntoResponse, Redirect};
use axum::Form;
use serde::Deserialize;
use tracing::info;

use aidas_core::User;

use crate::auth::AdminAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// `GET /admin` - server-rendered user management table. Non-admin
/// accounts only, unapproved first.
pub async fn panel(
    State(state): State<AppState>,
    AdminAuth(_session): AdminAuth,
) -> Result<impl IntoResponse, ApiError> {
    let users = state.repos.users.list_non_admins().await?;
    Ok(Html(render_panel(&users)))
}

fn render_panel(users: &[User]) -> String {
    let rows: String = users.iter().map(render_row).collect();

    let table = if users.is_empty() {
        "<p>Nėra vartotojų, kuriuos būtų galima valdyti.</p>".to_string()
    } else {
        format!(
            "<table><thead><tr><th>ID</th><th>El. Paštas</th><th>Užsiregistravo</th><th>Būsena</th><th>Veiksmas</th></tr></thead><tbody>{}</tbody></table>",
            rows
        )
    };

    format!(
        "<!DOCTYPE html><html lang=\"lt\"><head><meta charset=\"UTF-8\"><title>Admin Panelė</title>\
        <style>body{{font-family:sans-serif;padding:20px;background-color:#f8f9fa;color:#333;}}\
        table{{width:100%;border-collapse:collapse;background:white;}}\
        th,td{{padding:12px 15px;border:1px solid #dee2e6;text-align:left;}}\
        th{{background-color:#343a40;color:white;}}\
        button{{color:white;border:none;padding:8px 12px;cursor:pointer;border-radius:5px;}}\
        .approve-btn{{background-color:#28a745;}}.unapprove-btn{{background-color:#ffc107;color:black;}}</style>\
        </head><body><h1>Administratoriaus Panelė</h1><h2>Vartotojų Valdymas</h2>{}</body></html>",
        table
    )
}

fn render_row(user: &User) -> String {
    let (status_color, status_label) = if user.is_approved {
        ("green", "Patvirtintas")
    } else {
        ("red", "Nepatvirtintas")
    };

    let action = if user.is_approved {
        format!(
            "<form action=\"/admin/unapprove\" method=\"POST\"><input type=\"hidden\" name=\"userId\" value=\"{}\"><button type=\"submit\" class=\"unapprove-btn\">Atšaukti patvirtinimą</button></form>",
            user.id
        )
    } else {
        format!(
            "<form action=\"/admin/approve\" method=\"POST\"><input type=\"hidden\" name=\"userId\" value=\"{}\"><button type=\"submit\" class=\"approve-btn\">Patvirtinti</button></form>",
            user.id
        )
    };

    format!(
        "<tr><td>{}</td><td>{}</td><td>{}</td><td style=\"font-weight:bold;color:{};\">{}</td><td>{}</td></tr>",
        user.id,
        escape_html(&user.email),
        user.created_at.format("%Y-%m-%d %H:%M"),
        status_color,
        status_label,
        action
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[derive(Debug, Deserialize)]
pub struct ApprovalForm {
    #[serde(rename = "userId")]
    pub user_id: Option<i64>,
}

/// `POST /admin/approve` - activate an account.
pub async fn approve(
    State(state): State<AppState>,
    AdminAuth(session): AdminAuth,
    Form(form): Form<ApprovalForm>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = form
        .user_id
        .ok_or_else(|| ApiError::BadRequest("Trūksta vartotojo ID.".to_string()))?;

    state.repos.users.set_approved(user_id, true).await?;
    info!(
        subsystem = "api",
        op = "approve",
        admin_id = session.user_id,
        user_id,
        "User approved"
    );
    Ok(Redirect::to("/admin"))
}

/// `POST /admin/unapprove` - deactivate an account. Admins cannot revoke
/// their own approval.
pub async fn unapprove(
    State(state): State<AppState>,
    AdminAuth(session): AdminAuth,
    Form(form): Form<ApprovalForm>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = form
        .user_id
        .ok_or_else(|| ApiError::BadRequest("Trūksta vartotojo ID.".to_string()))?;

    if user_id == session.user_id {
        return Err(ApiError::BadRequest(
            "Negalima atšaukti savo paties patvirtinimo.".to_string(),
        ));
    }

    state.repos.users.set_approved(user_id, false).await?;
    info!(
        subsystem = "api",
        op = "unapprove",
        admin_id = session.user_id,
        user_id,
        "User approval revoked"
    );
    Ok(Redirect::to("/admin"))
}
