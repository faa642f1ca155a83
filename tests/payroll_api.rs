use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::{App, http::StatusCode, http::header, test, web::Data};
use serde_json::{Value, json};

use payroll_service::auth::credentials::{CredentialVerifier, Principal, StaticCredentials};
use payroll_service::auth::jwt::generate_token;
use payroll_service::config::{Config, StoreBackend};
use payroll_service::routes::{self, RateLimits};
use payroll_service::store::{MemoryStore, PayrollStore};

const SECRET: &str = "test-secret";

fn test_config() -> Config {
    Config {
        server_addr: "127.0.0.1:0".to_string(),
        store_backend: StoreBackend::Memory,
        database_url: String::new(),
        db_max_connections: 1,
        jwt_secret: SECRET.to_string(),
        token_ttl: 3600,
        admin_username: "admin".to_string(),
        admin_password: "admin123".to_string(),
        rate_login_per_min: 1000,
        rate_api_per_min: 10_000,
        api_prefix: "/api".to_string(),
        development: false,
        log_dir: "logs".to_string(),
    }
}

fn peer() -> SocketAddr {
    "127.0.0.1:40000".parse().unwrap()
}

fn bearer() -> String {
    let admin = Principal {
        username: "admin".to_string(),
        role: "admin".to_string(),
    };
    format!("Bearer {}", generate_token(&admin, SECRET, 3600).unwrap())
}

macro_rules! test_app {
    () => {{
        let config = test_config();
        let store: Arc<dyn PayrollStore> = Arc::new(MemoryStore::new());
        let verifier: Arc<dyn CredentialVerifier> =
            Arc::new(StaticCredentials::admin("admin", "admin123").unwrap());
        let limits = RateLimits::from_config(&config).unwrap();
        test::init_service(
            App::new()
                .app_data(Data::from(store))
                .app_data(Data::from(verifier))
                .app_data(Data::new(config.clone()))
                .configure(move |cfg| routes::configure(cfg, &config, &limits)),
        )
        .await
    }};
}

/// Sends the request and returns the status with the JSON body.
macro_rules! send {
    ($app:expr, $req:expr) => {{
        let resp = test::call_service(&$app, $req.peer_addr(peer()).to_request()).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }};
}

fn post(uri: &str, body: Value) -> test::TestRequest {
    test::TestRequest::post().uri(uri).set_json(body)
}

fn put(uri: &str, body: Value) -> test::TestRequest {
    test::TestRequest::put().uri(uri).set_json(body)
}

fn get(uri: &str) -> test::TestRequest {
    test::TestRequest::get().uri(uri)
}

fn delete(uri: &str) -> test::TestRequest {
    test::TestRequest::delete().uri(uri)
}

fn report(uri: &str) -> test::TestRequest {
    get(uri).insert_header((header::AUTHORIZATION, bearer()))
}

fn department(code: &str, name: &str) -> Value {
    json!({ "code": code, "name": name, "grossSalaryBudget": 500000 })
}

fn employee(first: &str, last: &str, department: &str) -> Value {
    json!({
        "firstName": first,
        "lastName": last,
        "position": "Analyst",
        "gender": "Female",
        "hiredDate": "2024-01-15",
        "departmentCode": department
    })
}

fn salary(employee: u64, gross: u64, deduction: u64, month: &str) -> Value {
    json!({
        "employeeNumber": employee,
        "grossSalary": gross,
        "totalDeduction": deduction,
        "month": month
    })
}

#[actix_web::test]
async fn test_payroll_scenario() {
    let app = test_app!();

    let (status, body) = send!(app, post("/api/departments", department("ENG", "Engineering")));
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["code"], "ENG");

    let (status, body) = send!(app, post("/api/employees", employee("Ada", "Lovelace", "ENG")));
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Employee created successfully");
    let number = body["data"]["number"].as_u64().unwrap();
    assert_eq!(number, 1);

    let (status, body) = send!(app, post("/api/salaries", salary(number, 800000, 150000, "2024-03")));
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["netSalary"].as_f64(), Some(650000.0));

    let (status, body) = send!(app, report("/api/reports/payroll/2024-03/ENG"));
    assert_eq!(status, StatusCode::OK);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["firstName"], "Ada");
    assert_eq!(rows[0]["lastName"], "Lovelace");
    assert_eq!(rows[0]["departmentName"], "Engineering");
    assert_eq!(rows[0]["netSalary"].as_f64(), Some(650000.0));

    assert_eq!(body["metadata"]["availableMonths"], json!(["2024-03"]));
    assert_eq!(
        body["metadata"]["counts"],
        json!({ "employeeCount": 1, "departmentCount": 1, "salaryCount": 1 })
    );
    assert_eq!(body["summary"]["rowCount"], 1);
    assert_eq!(body["summary"]["totalNetSalary"].as_f64(), Some(650000.0));
}

#[actix_web::test]
async fn test_client_net_salary_is_ignored() {
    let app = test_app!();
    send!(app, post("/api/departments", department("ENG", "Engineering")));
    send!(app, post("/api/employees", employee("Ada", "Lovelace", "ENG")));

    let mut body = salary(1, 1000, 250, "2024-03");
    body["netSalary"] = json!(999999);
    let (status, body) = send!(app, post("/api/salaries", body));
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["netSalary"].as_f64(), Some(750.0));

    let id = body["data"]["id"].as_u64().unwrap();
    let (status, body) = send!(app, put(&format!("/api/salaries/{id}"), salary(1, 2000, 500, "2024-03")));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["netSalary"].as_f64(), Some(1500.0));
}

#[actix_web::test]
async fn test_salary_for_unknown_employee_is_rejected() {
    let app = test_app!();

    let (status, body) = send!(app, post("/api/salaries", salary(42, 1000, 0, "2024-03")));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Invalid employee number 42");

    let (_, body) = send!(app, get("/api/salaries"));
    assert_eq!(body["data"], json!([]));
}

#[actix_web::test]
async fn test_duplicate_salary_month_is_rejected() {
    let app = test_app!();
    send!(app, post("/api/departments", department("ENG", "Engineering")));
    send!(app, post("/api/employees", employee("Ada", "Lovelace", "ENG")));

    let (status, _) = send!(app, post("/api/salaries", salary(1, 1000, 100, "2024-03")));
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send!(app, post("/api/salaries", salary(1, 2000, 100, "2024-03")));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Salary record already exists for employee 1 and month 2024-03"
    );

    let (_, body) = send!(app, get("/api/salaries/employee/1"));
    let records = body["data"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["grossSalary"].as_f64(), Some(1000.0));
}

#[actix_web::test]
async fn test_moving_salary_onto_taken_month_is_rejected() {
    let app = test_app!();
    send!(app, post("/api/departments", department("ENG", "Engineering")));
    send!(app, post("/api/employees", employee("Ada", "Lovelace", "ENG")));
    send!(app, post("/api/salaries", salary(1, 1000, 100, "2024-02")));
    let (_, body) = send!(app, post("/api/salaries", salary(1, 1000, 100, "2024-03")));
    let march = body["data"]["id"].as_u64().unwrap();

    // same month as itself is fine
    let (status, _) = send!(app, put(&format!("/api/salaries/{march}"), salary(1, 1200, 100, "2024-03")));
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send!(app, put(&format!("/api/salaries/{march}"), salary(1, 1200, 100, "2024-02")));
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_employee_needs_existing_department() {
    let app = test_app!();

    let (status, body) = send!(app, post("/api/employees", employee("Ada", "Lovelace", "OPS")));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid department code 'OPS'");

    let (_, body) = send!(app, get("/api/employees"));
    assert_eq!(body["data"], json!([]));
}

#[actix_web::test]
async fn test_delete_guards_run_bottom_up() {
    let app = test_app!();
    send!(app, post("/api/departments", department("ENG", "Engineering")));
    send!(app, post("/api/employees", employee("Ada", "Lovelace", "ENG")));
    let (_, body) = send!(app, post("/api/salaries", salary(1, 1000, 100, "2024-03")));
    let salary_id = body["data"]["id"].as_u64().unwrap();

    let (status, body) = send!(app, delete("/api/departments/ENG"));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Cannot delete department 'ENG' with 1 existing employee(s)"
    );

    let (status, _) = send!(app, delete("/api/employees/1"));
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send!(app, delete(&format!("/api/salaries/{salary_id}")));
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send!(app, delete("/api/employees/1"));
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send!(app, delete("/api/departments/ENG"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Department deleted successfully");

    let (status, body) = send!(app, get("/api/departments/ENG"));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Department not found");
}

#[actix_web::test]
async fn test_duplicate_department_code() {
    let app = test_app!();
    send!(app, post("/api/departments", department("ENG", "Engineering")));

    // codes are normalized before the uniqueness check
    let (status, body) = send!(app, post("/api/departments", department(" eng ", "Other")));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Department code 'ENG' already exists");
}

#[actix_web::test]
async fn test_report_rows_ordered_by_name_with_zero_default() {
    let app = test_app!();
    send!(app, post("/api/departments", department("ENG", "Engineering")));
    send!(app, post("/api/departments", department("OPS", "Operations")));
    send!(app, post("/api/employees", employee("Grace", "Hopper", "ENG")));
    send!(app, post("/api/employees", employee("Ada", "Lovelace", "ENG")));
    send!(app, post("/api/employees", employee("Alan", "Babbage", "ENG")));
    send!(app, post("/api/employees", employee("Edsger", "Dijkstra", "OPS")));
    send!(app, post("/api/salaries", salary(1, 900, 100, "2024-03")));
    send!(app, post("/api/salaries", salary(2, 800, 150, "2024-02")));
    send!(app, post("/api/salaries", salary(4, 700, 0, "2024-03")));

    let (status, first) = send!(app, report("/api/reports/payroll/2024-03/ENG"));
    assert_eq!(status, StatusCode::OK);

    let rows = first["data"].as_array().unwrap();
    let names: Vec<&str> = rows.iter().map(|r| r["lastName"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Babbage", "Hopper", "Lovelace"]);

    let nets: Vec<f64> = rows.iter().map(|r| r["netSalary"].as_f64().unwrap()).collect();
    assert_eq!(nets, vec![0.0, 800.0, 0.0]);

    assert_eq!(first["metadata"]["availableMonths"], json!(["2024-03", "2024-02"]));
    assert_eq!(first["summary"]["totalNetSalary"].as_f64(), Some(800.0));

    let (_, second) = send!(app, report("/api/reports/payroll/2024-03/ENG"));
    assert_eq!(first, second);
}

#[actix_web::test]
async fn test_report_narrowed_by_employee_and_search() {
    let app = test_app!();
    send!(app, post("/api/departments", department("ENG", "Engineering")));
    send!(app, post("/api/employees", employee("Grace", "Hopper", "ENG")));
    send!(app, post("/api/employees", employee("Ada", "Lovelace", "ENG")));
    send!(app, post("/api/salaries", salary(2, 800000, 150000, "2024-03")));

    let (_, body) = send!(app, report("/api/reports/payroll/2024-03/ENG?employeeNumber=2"));
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["employeeNumber"], 2);

    let (_, body) = send!(app, report("/api/reports/payroll/2024-03/ENG?search=HOP"));
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["lastName"], "Hopper");
    assert_eq!(body["summary"]["rowCount"], 1);
    assert_eq!(body["summary"]["totalNetSalary"].as_f64(), Some(0.0));

    // lower-case department in the path resolves to the stored code
    let (_, body) = send!(app, report("/api/reports/payroll/2024-03/eng"));
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn test_report_filter_errors() {
    let app = test_app!();

    let (status, body) = send!(app, report("/api/reports/payroll/2024-13/ENG"));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid month format '2024-13'. Use YYYY-MM");

    let (status, body) = send!(app, report("/api/reports/payroll/2024-03"));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Department code is required");

    let (status, body) = send!(app, report("/api/reports/payroll/2024-03/ENG?employeeNumber=abc"));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "employeeNumber");

    // an unknown department is an empty report, not an error
    let (status, body) = send!(app, report("/api/reports/payroll/2024-03/NONE"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
}

#[actix_web::test]
async fn test_report_requires_token() {
    let app = test_app!();

    let (status, body) = send!(app, get("/api/reports/payroll/2024-03/ENG"));
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Access token is required");

    let (status, body) = send!(
        app,
        get("/api/reports/payroll/2024-03/ENG")
            .insert_header((header::AUTHORIZATION, "Bearer not-a-token"))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid or expired token");
}

#[actix_web::test]
async fn test_login_and_me() {
    let app = test_app!();

    let (status, body) = send!(
        app,
        post("/api/auth/login", json!({ "username": "admin", "password": "admin123" }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"], json!({ "username": "admin", "role": "admin" }));
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let (status, body) = send!(
        app,
        get("/api/auth/me").insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["username"], "admin");
    assert_eq!(body["data"]["user"]["role"], "admin");
}

#[actix_web::test]
async fn test_login_failures() {
    let app = test_app!();

    let (status, body) = send!(
        app,
        post("/api/auth/login", json!({ "username": "admin", "password": "wrong" }))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid username or password");

    let (status, body) = send!(
        app,
        post("/api/auth/login", json!({ "username": " ", "password": "" }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["password", "username"]);
}

#[actix_web::test]
async fn test_malformed_body_is_a_validation_error() {
    let app = test_app!();

    let (status, body) = send!(
        app,
        post("/api/salaries", json!({ "employeeNumber": "one", "grossSalary": 1 }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["errors"][0]["field"], "body");

    let (status, body) = send!(app, get("/api/employees/abc"));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "path");
}

#[actix_web::test]
async fn test_salary_listings_join_employee_details() {
    let app = test_app!();
    send!(app, post("/api/departments", department("ENG", "Engineering")));
    send!(app, post("/api/employees", employee("Grace", "Hopper", "ENG")));
    send!(app, post("/api/employees", employee("Ada", "Lovelace", "ENG")));
    send!(app, post("/api/salaries", salary(1, 100, 0, "2024-02")));
    send!(app, post("/api/salaries", salary(2, 100, 0, "2024-03")));
    send!(app, post("/api/salaries", salary(1, 100, 0, "2024-03")));

    let (_, body) = send!(app, get("/api/salaries"));
    let order: Vec<(String, String)> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| {
            (
                s["month"].as_str().unwrap().to_string(),
                s["lastName"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    assert_eq!(
        order,
        vec![
            ("2024-03".to_string(), "Hopper".to_string()),
            ("2024-03".to_string(), "Lovelace".to_string()),
            ("2024-02".to_string(), "Hopper".to_string()),
        ]
    );
    assert_eq!(body["data"][0]["departmentName"], "Engineering");

    let (_, body) = send!(app, get("/api/employees/2"));
    assert_eq!(body["data"]["departmentName"], "Engineering");
    assert_eq!(body["data"]["firstName"], "Ada");
}
