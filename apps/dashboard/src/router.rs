use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::router::appointment_routes;
use appointment_cell::{
    AppointmentRepository, AppointmentService, AppointmentState, AppointmentsStore,
    BookingServices, BookingSessions,
};
use auth_cell::router::auth_routes;
use auth_cell::SessionService;
use availability_cell::router::availability_routes;
use availability_cell::{AvailabilityCache, AvailabilityRepository, AvailabilityService, AvailabilityState};
use professional_cell::router::professional_routes;
use professional_cell::ProfessionalDirectory;
use shared_config::AppConfig;
use shared_models::notification::{Notifier, TracingNotifier};

pub fn create_router(config: Arc<AppConfig>) -> Router {
    let stale_after = config.cache_stale_after();
    let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);

    let sessions = Arc::new(SessionService::new(&config));
    let directory = Arc::new(ProfessionalDirectory::new(&config));

    let availability_repository: Arc<dyn AvailabilityRepository> =
        Arc::new(AvailabilityService::new(&config));
    let availability_cache = Arc::new(AvailabilityCache::new(
        availability_repository.clone(),
        notifier.clone(),
        stale_after,
    ));

    let appointment_repository: Arc<dyn AppointmentRepository> =
        Arc::new(AppointmentService::new(&config));
    let store = Arc::new(AppointmentsStore::new(appointment_repository.clone(), stale_after));
    let bookings = Arc::new(BookingSessions::new(
        BookingServices {
            repository: appointment_repository,
            appointments: store.clone(),
            slots: availability_repository.clone(),
            availability: availability_cache.clone(),
            notifier,
        },
        stale_after,
    ));

    Router::new()
        .route("/", get(|| async { "Carebook dashboard is running!" }))
        .nest("/auth", auth_routes(config.clone(), sessions.clone()))
        .nest("/professionals", professional_routes(config.clone(), sessions.clone(), directory))
        .nest(
            "/availability",
            availability_routes(
                config.clone(),
                sessions.clone(),
                Arc::new(AvailabilityState {
                    repository: availability_repository,
                    cache: availability_cache,
                }),
            ),
        )
        .nest(
            "/appointments",
            appointment_routes(config, sessions, Arc::new(AppointmentState { store, bookings })),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use shared_utils::test_utils::TestConfig;

    #[tokio::test]
    async fn health_text_is_public() {
        let app = create_router(TestConfig::default().to_arc());

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Carebook dashboard is running!");
    }

    #[tokio::test]
    async fn cell_routes_require_a_token() {
        let app = create_router(TestConfig::default().to_arc());

        for uri in ["/auth/me", "/professionals", "/availability/mine", "/appointments"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }
}
