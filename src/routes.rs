use std::sync::Arc;

use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use anyhow::anyhow;

use crate::{
    api::{department, employee, report, salary},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
    error::{json_error_handler, path_error_handler, query_error_handler},
};

type Limiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

/// Per-IP limiters, built once so every worker shares the same quota.
#[derive(Clone)]
pub struct RateLimits {
    login: Limiter,
    api: Limiter,
}

fn build_limiter(requests_per_min: u32) -> anyhow::Result<Limiter> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);

    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit of {requests_per_min} requests/min"))?;

    Ok(Arc::new(Governor::new(&cfg)))
}

impl RateLimits {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            login: build_limiter(config.rate_login_per_min)?,
            api: build_limiter(config.rate_api_per_min)?,
        })
    }
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limits: &RateLimits) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler));

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(limits.api.clone())
            .service(
                web::scope("/auth")
                    .service(
                        web::resource("/login")
                            .wrap(limits.login.clone())
                            .route(web::post().to(handlers::login)),
                    )
                    .service(
                        web::resource("/me")
                            .wrap(from_fn(auth_middleware))
                            .route(web::get().to(handlers::me)),
                    ),
            )
            .service(
                web::scope("/departments")
                    // /departments
                    .service(
                        web::resource("")
                            .route(web::get().to(department::list_departments))
                            .route(web::post().to(department::create_department)),
                    )
                    // /departments/{code}
                    .service(
                        web::resource("/{code}")
                            .route(web::get().to(department::get_department))
                            .route(web::put().to(department::update_department))
                            .route(web::delete().to(department::delete_department)),
                    ),
            )
            .service(
                web::scope("/employees")
                    .service(
                        web::resource("")
                            .route(web::get().to(employee::list_employees))
                            .route(web::post().to(employee::create_employee)),
                    )
                    .service(
                        web::resource("/{employee_id}")
                            .route(web::get().to(employee::get_employee))
                            .route(web::put().to(employee::update_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    ),
            )
            .service(
                web::scope("/salaries")
                    .service(
                        web::resource("")
                            .route(web::get().to(salary::list_salaries))
                            .route(web::post().to(salary::create_salary)),
                    )
                    // /salaries/employee/{employee_id}
                    .service(
                        web::resource("/employee/{employee_id}")
                            .route(web::get().to(salary::list_employee_salaries)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(salary::get_salary))
                            .route(web::put().to(salary::update_salary))
                            .route(web::delete().to(salary::delete_salary)),
                    ),
            )
            .service(
                web::scope("/reports")
                    .wrap(from_fn(auth_middleware))
                    .service(
                        web::resource("/payroll/{month}")
                            .route(web::get().to(report::payroll_report_without_department)),
                    )
                    .service(
                        web::resource("/payroll/{month}/{department_code}")
                            .route(web::get().to(report::payroll_report)),
                    ),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_rate_is_clamped() {
        assert!(build_limiter(0).is_ok());
        assert!(build_limiter(60).is_ok());
    }
}
