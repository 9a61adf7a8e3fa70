#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::items_after_statements)]

mod auth;
mod calendar;
mod cfg;
mod error;
mod liquid_utils;
mod routes;
mod state;

use crate::{
    auth::backend::AlmanacAuthBackend, cfg::Settings, error::not_found_fallback,
    state::AlmanacState,
};
use axum::Router;
use axum_login::AuthManagerLayerBuilder;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tower_sessions::{MemoryStore, SessionManagerLayer};
use tracing_subscriber::EnvFilter;

#[macro_use]
extern crate tracing;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = Settings::new().await.expect("unable to get settings");

    let db_url = std::env::var("DATABASE_URL").expect("DB URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await
        .expect("cannot connect to DB");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("unable to run migrations");

    let state = AlmanacState::new(pool, settings);

    let session_layer = SessionManagerLayer::new(MemoryStore::default());
    let auth_layer =
        AuthManagerLayerBuilder::new(AlmanacAuthBackend::new(state.clone()), session_layer)
            .build();

    let app = Router::new()
        .merge(routes::add_event::router())
        .merge(routes::update_event::router())
        .merge(routes::remove_event::router())
        .merge(routes::show_users::router())
        .merge(routes::edit_profile::router())
        .merge(routes::index::router())
        .merge(routes::calendar::router())
        .merge(routes::show_events::router())
        .merge(auth::login::router())
        .fallback(not_found_fallback)
        .layer(TraceLayer::new_for_http())
        .layer(auth_layer)
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 8080));
    let listener = TcpListener::bind(addr).await.expect("unable to bind");
    info!(%addr, "Serving");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("unable to listen for ctrl-c");
            info!("Shutting down");
        })
        .await
        .expect("error serving");
}
