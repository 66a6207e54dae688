use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::cache::ClearReport;
use crate::catalog::WeatherSnapshot;
use crate::handlers;
use crate::location::LocationBasis;
use common::models::ForecastResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::list_weather,
        handlers::add_city,
        handlers::report_location,
        handlers::remove_city,
        handlers::clear_cache,
    ),
    components(schemas(
        WeatherSnapshot,
        LocationBasis,
        ForecastResponse,
        ClearReport,
        handlers::AddCityRequest,
        handlers::LocationUpdate,
        handlers::RefreshResponse,
        handlers::RefreshSource,
        handlers::RemoveResponse,
    )),
    tags(
        (name = "weather", description = "Tracked locations and their forecasts"),
        (name = "cache", description = "On-disk forecast cache"),
    ),
)]
struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}
