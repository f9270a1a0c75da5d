#[cfg(test)]
mod integration_tests {
    use crate::test_utils::test_utils::{
        create_staff_user, example_offer_payload, register, setup_test_app,
        setup_test_server_with_state,
    };
    use axum::http::header::AUTHORIZATION;
    use axum::http::{HeaderValue, StatusCode};
    use axum_test::TestServer;
    use rust_decimal::Decimal;
    use serde_json::{json, Value};
    use std::str::FromStr;

    fn token(value: &str) -> HeaderValue {
        HeaderValue::from_str(&format!("Token {value}")).unwrap()
    }

    fn decimal(value: &Value) -> Decimal {
        Decimal::from_str(value.as_str().expect("expected decimal string")).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server.get("/health").await;

        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["database"], "connected");
    }

    // ---- Registration and login ----

    #[tokio::test]
    async fn test_registration_success() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server
            .post("/api/v1/registration")
            .json(&json!({
                "username": "anna_business",
                "email": "anna@example.com",
                "password": "examplePassword",
                "repeated_password": "examplePassword",
                "type": "business",
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["username"], "anna_business");
        assert_eq!(body["data"]["email"], "anna@example.com");
        assert!(body["data"]["user_id"].as_i64().unwrap() > 0);
        assert!(!body["data"]["token"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_registration_password_mismatch() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server
            .post("/api/v1/registration")
            .json(&json!({
                "username": "mismatched",
                "email": "mismatched@example.com",
                "password": "examplePassword",
                "repeated_password": "somethingElse",
                "type": "customer",
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["fields"]["repeated_password"].is_string());

        // Failed validation leaves no user row behind
        let login = server
            .post("/api/v1/login")
            .json(&json!({"username": "mismatched", "password": "examplePassword"}))
            .await;
        login.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_registration_duplicate_username() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        register(&server, "taken_name", "customer").await;

        let response = server
            .post("/api/v1/registration")
            .json(&json!({
                "username": "taken_name",
                "email": "other@example.com",
                "password": "examplePassword",
                "repeated_password": "examplePassword",
                "type": "customer",
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["fields"]["username"].is_string());
    }

    #[tokio::test]
    async fn test_registration_invalid_type() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server
            .post("/api/v1/registration")
            .json(&json!({
                "username": "wannabe_staff",
                "email": "wannabe@example.com",
                "password": "examplePassword",
                "repeated_password": "examplePassword",
                "type": "staff",
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["fields"]["type"].is_string());
    }

    #[tokio::test]
    async fn test_login_success() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        register(&server, "login_user", "customer").await;

        let response = server
            .post("/api/v1/login")
            .json(&json!({"username": "login_user", "password": "examplePassword"}))
            .await;

        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["data"]["username"], "login_user");
        assert_eq!(body["data"]["email"], "login_user@example.com");
        assert!(body["data"]["token"].is_string());
        assert!(body["data"].get("first_name").is_some());
        assert!(body["data"].get("last_name").is_some());
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        register(&server, "secure_user", "customer").await;

        let response = server
            .post("/api/v1/login")
            .json(&json!({"username": "secure_user", "password": "wrongPassword"}))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn test_login_missing_fields() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server
            .post("/api/v1/login")
            .json(&json!({"username": "", "password": ""}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    // ---- Profiles ----

    #[tokio::test]
    async fn test_get_profile_requires_auth() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server.get("/api/v1/profile/1").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_get_profile() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (auth_token, user_id) = register(&server, "profile_user", "business").await;

        let response = server
            .get(&format!("/api/v1/profile/{}", user_id))
            .add_header(AUTHORIZATION, token(&auth_token))
            .await;

        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["data"]["user"], user_id);
        assert_eq!(body["data"]["username"], "profile_user");
        assert_eq!(body["data"]["type"], "business");
        assert_eq!(body["data"]["email"], "profile_user@example.com");
        assert!(body["data"]["created_at"].is_string());
    }

    #[tokio::test]
    async fn test_update_profile_owner() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (auth_token, user_id) = register(&server, "editable_user", "business").await;

        let response = server
            .patch(&format!("/api/v1/profile/{}", user_id))
            .add_header(AUTHORIZATION, token(&auth_token))
            .json(&json!({
                "first_name": "Anna",
                "last_name": "Schmidt",
                "location": "Berlin",
                "email": "anna.schmidt@example.com",
                "working_hours": "9-17",
            }))
            .await;

        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["data"]["first_name"], "Anna");
        assert_eq!(body["data"]["location"], "Berlin");
        assert_eq!(body["data"]["email"], "anna.schmidt@example.com");
        assert_eq!(body["data"]["working_hours"], "9-17");

        // The account copy of the email changed too
        let login: Value = server
            .post("/api/v1/login")
            .json(&json!({"username": "editable_user", "password": "examplePassword"}))
            .await
            .json();
        assert_eq!(login["data"]["email"], "anna.schmidt@example.com");
        assert_eq!(login["data"]["first_name"], "Anna");
    }

    #[tokio::test]
    async fn test_update_profile_not_owner_forbidden() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (_, owner_id) = register(&server, "profile_owner", "business").await;
        let (intruder_token, _) = register(&server, "profile_intruder", "customer").await;

        let response = server
            .patch(&format!("/api/v1/profile/{}", owner_id))
            .add_header(AUTHORIZATION, token(&intruder_token))
            .json(&json!({"first_name": "Hacked"}))
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_update_profile_staff_allowed() {
        let (server, state) = setup_test_server_with_state().await;

        let (_, owner_id) = register(&server, "moderated_user", "customer").await;
        let (staff_token, _) = create_staff_user(&state.db, "moderator").await;

        let response = server
            .patch(&format!("/api/v1/profile/{}", owner_id))
            .add_header(AUTHORIZATION, token(&staff_token))
            .json(&json!({"description": "cleaned up by moderation"}))
            .await;

        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["data"]["description"], "cleaned up by moderation");
    }

    #[tokio::test]
    async fn test_list_business_profiles_public_shape() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (viewer_token, _) = register(&server, "profile_viewer", "customer").await;
        let (_, business_id) = register(&server, "listed_business", "business").await;

        let response = server
            .get("/api/v1/profiles/business")
            .add_header(AUTHORIZATION, token(&viewer_token))
            .await;

        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        let rows = body["data"].as_array().unwrap();
        let row = rows.iter().find(|r| r["user"] == business_id).unwrap();
        assert_eq!(row["type"], "business");
        assert!(row.get("location").is_some());
        // The public shape carries no email
        assert!(row.get("email").is_none());
    }

    #[tokio::test]
    async fn test_customer_profile_detail_type_mismatch() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (viewer_token, _) = register(&server, "shape_viewer", "customer").await;
        let (_, business_id) = register(&server, "typed_business", "business").await;

        // A business user is not served through the customer collection
        let response = server
            .get(&format!("/api/v1/profiles/customer/{}", business_id))
            .add_header(AUTHORIZATION, token(&viewer_token))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);

        let response = server
            .get(&format!("/api/v1/profiles/business/{}", business_id))
            .add_header(AUTHORIZATION, token(&viewer_token))
            .await;
        response.assert_status(StatusCode::OK);
    }

    // ---- Offers ----

    async fn create_offer(server: &TestServer, auth_token: &str, title: &str) -> Value {
        let response = server
            .post("/api/v1/offers")
            .add_header(AUTHORIZATION, token(auth_token))
            .json(&example_offer_payload(title))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }

    #[tokio::test]
    async fn test_create_offer_business() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (auth_token, user_id) = register(&server, "offer_maker", "business").await;
        let body = create_offer(&server, &auth_token, "Logo design").await;

        assert_eq!(body["data"]["title"], "Logo design");
        assert_eq!(body["data"]["user"], user_id);
        assert_eq!(body["data"]["details"].as_array().unwrap().len(), 3);
        assert_eq!(body["data"]["details"][0]["offer_type"], "basic");
        assert_eq!(decimal(&body["data"]["details"][0]["price"]), Decimal::from_str("50.00").unwrap());
    }

    #[tokio::test]
    async fn test_create_offer_customer_forbidden() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (auth_token, _) = register(&server, "offer_wannabe", "customer").await;

        let response = server
            .post("/api/v1/offers")
            .add_header(AUTHORIZATION, token(&auth_token))
            .json(&example_offer_payload("Not allowed"))
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
        let body: Value = response.json();
        assert_eq!(body["code"], "BUSINESS_ONLY");
    }

    #[tokio::test]
    async fn test_create_offer_requires_auth() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server
            .post("/api/v1/offers")
            .json(&example_offer_payload("Anonymous offer"))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_offer_invalid_tier() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (auth_token, _) = register(&server, "sloppy_business", "business").await;

        let mut payload = example_offer_payload("Broken offer");
        payload["details"][1]["offer_type"] = json!("deluxe");
        payload["details"][2]["delivery_time_in_days"] = json!(0);

        let response = server
            .post("/api/v1/offers")
            .add_header(AUTHORIZATION, token(&auth_token))
            .json(&payload)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["fields"]["details[1].offer_type"].is_string());
        assert!(body["fields"]["details[2].delivery_time_in_days"].is_string());
    }

    #[tokio::test]
    async fn test_offer_list_aggregates() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (auth_token, _) = register(&server, "aggregate_business", "business").await;
        create_offer(&server, &auth_token, "Aggregated offer").await;

        // Browsing offers needs no authentication
        let response = server.get("/api/v1/offers").await;

        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["data"]["count"], 1);
        let row = &body["data"]["results"][0];
        assert_eq!(decimal(&row["min_price"]), Decimal::from_str("50.00").unwrap());
        assert_eq!(row["min_delivery_time"], 7);
        assert_eq!(row["max_delivery_time"], 14);
        assert_eq!(row["user_details"]["username"], "aggregate_business");

        // Tier rows appear as lazy references
        let detail_ref = &row["details"][0];
        let url = detail_ref["url"].as_str().unwrap();
        assert_eq!(url, &format!("/api/v1/offerdetails/{}", detail_ref["id"]));
        server.get(url).await.assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_offer_list_filters() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (auth_token, _) = register(&server, "filter_business", "business").await;
        create_offer(&server, &auth_token, "Cheap and fast").await;

        let mut expensive = example_offer_payload("Expensive and slow");
        expensive["details"][0]["price"] = json!("500.00");
        expensive["details"][0]["delivery_time_in_days"] = json!(20);
        expensive["details"][1]["price"] = json!("900.00");
        expensive["details"][1]["delivery_time_in_days"] = json!(30);
        expensive["details"][2]["price"] = json!("1500.00");
        expensive["details"][2]["delivery_time_in_days"] = json!(40);
        server
            .post("/api/v1/offers")
            .add_header(AUTHORIZATION, token(&auth_token))
            .json(&expensive)
            .await
            .assert_status(StatusCode::CREATED);

        // Price floor keeps only the expensive offer
        let body: Value = server.get("/api/v1/offers?min_price=100").await.json();
        assert_eq!(body["data"]["count"], 1);
        assert_eq!(body["data"]["results"][0]["title"], "Expensive and slow");

        // Delivery ceiling keeps only the fast offer
        let body: Value = server.get("/api/v1/offers?max_delivery_time=10").await.json();
        assert_eq!(body["data"]["count"], 1);
        assert_eq!(body["data"]["results"][0]["title"], "Cheap and fast");

        // Search matches the title substring
        let body: Value = server.get("/api/v1/offers?search=Expensive").await.json();
        assert_eq!(body["data"]["count"], 1);
        assert_eq!(body["data"]["results"][0]["title"], "Expensive and slow");
    }

    #[tokio::test]
    async fn test_offer_list_ordering_by_min_price() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (auth_token, _) = register(&server, "ordering_business", "business").await;
        create_offer(&server, &auth_token, "Mid offer").await;

        let mut pricey = example_offer_payload("Pricey offer");
        pricey["details"][0]["price"] = json!("800.00");
        server
            .post("/api/v1/offers")
            .add_header(AUTHORIZATION, token(&auth_token))
            .json(&pricey)
            .await
            .assert_status(StatusCode::CREATED);

        let body: Value = server.get("/api/v1/offers?ordering=-min_price").await.json();
        let results = body["data"]["results"].as_array().unwrap();
        assert_eq!(results[0]["title"], "Pricey offer");
        assert_eq!(results[1]["title"], "Mid offer");

        let body: Value = server.get("/api/v1/offers?ordering=min_price").await.json();
        let results = body["data"]["results"].as_array().unwrap();
        assert_eq!(results[0]["title"], "Mid offer");
    }

    #[tokio::test]
    async fn test_offer_list_pagination() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (auth_token, _) = register(&server, "paging_business", "business").await;
        for index in 0..3 {
            create_offer(&server, &auth_token, &format!("Offer {index}")).await;
        }

        let body: Value = server.get("/api/v1/offers?page_size=2").await.json();
        assert_eq!(body["data"]["count"], 3);
        assert_eq!(body["data"]["page"], 1);
        assert_eq!(body["data"]["page_size"], 2);
        assert_eq!(body["data"]["total_pages"], 2);
        assert_eq!(body["data"]["results"].as_array().unwrap().len(), 2);

        let body: Value = server.get("/api/v1/offers?page_size=2&page=2").await.json();
        assert_eq!(body["data"]["page"], 2);
        assert_eq!(body["data"]["results"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_offer_list_creator_filter() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (first_token, first_id) = register(&server, "first_creator", "business").await;
        let (second_token, _) = register(&server, "second_creator", "business").await;
        create_offer(&server, &first_token, "First creator offer").await;
        create_offer(&server, &second_token, "Second creator offer").await;

        let body: Value = server
            .get(&format!("/api/v1/offers?creator_id={first_id}"))
            .await
            .json();
        assert_eq!(body["data"]["count"], 1);
        assert_eq!(body["data"]["results"][0]["user"], first_id);
    }

    #[tokio::test]
    async fn test_get_offer_expands_details() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (auth_token, _) = register(&server, "detail_business", "business").await;
        let created = create_offer(&server, &auth_token, "Expanded offer").await;
        let offer_id = created["data"]["id"].as_i64().unwrap();

        let response = server.get(&format!("/api/v1/offers/{}", offer_id)).await;

        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        let details = body["data"]["details"].as_array().unwrap();
        assert_eq!(details.len(), 3);
        // Expanded tiers, not references
        assert!(details[0].get("price").is_some());
        assert!(details[0].get("features").is_some());
        assert_eq!(decimal(&body["data"]["min_price"]), Decimal::from_str("50.00").unwrap());
    }

    #[tokio::test]
    async fn test_update_offer_replaces_tiers_wholesale() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (auth_token, _) = register(&server, "replacing_business", "business").await;
        let created = create_offer(&server, &auth_token, "Replaceable offer").await;
        let offer_id = created["data"]["id"].as_i64().unwrap();
        let old_detail_id = created["data"]["details"][0]["id"].as_i64().unwrap();

        let response = server
            .patch(&format!("/api/v1/offers/{}", offer_id))
            .add_header(AUTHORIZATION, token(&auth_token))
            .json(&json!({
                "title": "Replaced offer",
                "details": [
                    {
                        "title": "Single package",
                        "revisions": 3,
                        "delivery_time_in_days": 4,
                        "price": "75.00",
                        "features": ["Everything"],
                        "offer_type": "basic"
                    }
                ]
            }))
            .await;

        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["data"]["title"], "Replaced offer");
        assert_eq!(body["data"]["details"].as_array().unwrap().len(), 1);

        // The old tier rows are gone
        server
            .get(&format!("/api/v1/offerdetails/{}", old_detail_id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_offer_not_owner_forbidden() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (owner_token, _) = register(&server, "offer_owner", "business").await;
        let (other_token, _) = register(&server, "other_business", "business").await;
        let created = create_offer(&server, &owner_token, "Protected offer").await;
        let offer_id = created["data"]["id"].as_i64().unwrap();

        let response = server
            .patch(&format!("/api/v1/offers/{}", offer_id))
            .add_header(AUTHORIZATION, token(&other_token))
            .json(&json!({"title": "Taken over"}))
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_delete_offer_cascades() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (auth_token, _) = register(&server, "deleting_business", "business").await;
        let created = create_offer(&server, &auth_token, "Doomed offer").await;
        let offer_id = created["data"]["id"].as_i64().unwrap();
        let detail_id = created["data"]["details"][0]["id"].as_i64().unwrap();

        server
            .delete(&format!("/api/v1/offers/{}", offer_id))
            .add_header(AUTHORIZATION, token(&auth_token))
            .await
            .assert_status(StatusCode::OK);

        server
            .get(&format!("/api/v1/offers/{}", offer_id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .get(&format!("/api/v1/offerdetails/{}", detail_id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    // ---- Orders ----

    async fn setup_order(
        server: &TestServer,
    ) -> (String, i32, String, i32, Value) {
        let (business_token, business_id) = register(server, "order_business", "business").await;
        let (customer_token, customer_id) = register(server, "order_customer", "customer").await;
        let created = create_offer(server, &business_token, "Orderable offer").await;
        let detail_id = created["data"]["details"][2]["id"].as_i64().unwrap();

        let response = server
            .post("/api/v1/orders")
            .add_header(AUTHORIZATION, token(&customer_token))
            .json(&json!({"offer_detail_id": detail_id}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let order: Value = response.json();

        (business_token, business_id, customer_token, customer_id, order)
    }

    #[tokio::test]
    async fn test_create_order_snapshots_tier() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (_, business_id, _, customer_id, order) = setup_order(&server).await;

        assert_eq!(order["data"]["business_user"], business_id);
        assert_eq!(order["data"]["customer_user"], customer_id);
        assert_eq!(order["data"]["status"], "in_progress");
        assert_eq!(order["data"]["title"], "Premium package");
        assert_eq!(order["data"]["offer_type"], "premium");
        assert_eq!(order["data"]["revisions"], -1);
        assert_eq!(decimal(&order["data"]["price"]), Decimal::from_str("300.00").unwrap());
    }

    #[tokio::test]
    async fn test_order_snapshot_survives_tier_replacement() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (business_token, _, customer_token, _, order) = setup_order(&server).await;
        let order_id = order["data"]["id"].as_i64().unwrap();

        // Replace every tier of the parent offer
        let offers: Value = server.get("/api/v1/offers").await.json();
        let offer_id = offers["data"]["results"][0]["id"].as_i64().unwrap();
        server
            .patch(&format!("/api/v1/offers/{}", offer_id))
            .add_header(AUTHORIZATION, token(&business_token))
            .json(&json!({
                "details": [
                    {
                        "title": "New single package",
                        "revisions": 1,
                        "delivery_time_in_days": 2,
                        "price": "999.00",
                        "features": ["New deal"],
                        "offer_type": "basic"
                    }
                ]
            }))
            .await
            .assert_status(StatusCode::OK);

        // The order still carries the original snapshot
        let response = server
            .get(&format!("/api/v1/orders/{}", order_id))
            .add_header(AUTHORIZATION, token(&customer_token))
            .await;
        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["data"]["title"], "Premium package");
        assert_eq!(decimal(&body["data"]["price"]), Decimal::from_str("300.00").unwrap());
    }

    #[tokio::test]
    async fn test_create_order_missing_tier() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (auth_token, _) = register(&server, "hopeful_customer", "customer").await;

        let response = server
            .post("/api/v1/orders")
            .add_header(AUTHORIZATION, token(&auth_token))
            .json(&json!({"offer_detail_id": 99999}))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_order_business_forbidden() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (auth_token, _) = register(&server, "buying_business", "business").await;
        let created = create_offer(&server, &auth_token, "Self service").await;
        let detail_id = created["data"]["details"][0]["id"].as_i64().unwrap();

        let response = server
            .post("/api/v1/orders")
            .add_header(AUTHORIZATION, token(&auth_token))
            .json(&json!({"offer_detail_id": detail_id}))
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
        let body: Value = response.json();
        assert_eq!(body["code"], "CUSTOMER_ONLY");
    }

    #[tokio::test]
    async fn test_order_visibility() {
        let (server, state) = setup_test_server_with_state().await;

        let (business_token, _, customer_token, _, _) = setup_order(&server).await;
        let (outsider_token, _) = register(&server, "outsider", "customer").await;
        let (staff_token, _) = create_staff_user(&state.db, "order_admin").await;

        // Both participants see the order
        let body: Value = server
            .get("/api/v1/orders")
            .add_header(AUTHORIZATION, token(&customer_token))
            .await
            .json();
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let body: Value = server
            .get("/api/v1/orders")
            .add_header(AUTHORIZATION, token(&business_token))
            .await
            .json();
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        // An unrelated user sees nothing
        let body: Value = server
            .get("/api/v1/orders")
            .add_header(AUTHORIZATION, token(&outsider_token))
            .await
            .json();
        assert_eq!(body["data"].as_array().unwrap().len(), 0);

        // Staff sees everything
        let body: Value = server
            .get("/api/v1/orders")
            .add_header(AUTHORIZATION, token(&staff_token))
            .await
            .json();
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_order_status_update_by_business() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (business_token, _, _, _, order) = setup_order(&server).await;
        let order_id = order["data"]["id"].as_i64().unwrap();

        let response = server
            .patch(&format!("/api/v1/orders/{}", order_id))
            .add_header(AUTHORIZATION, token(&business_token))
            .json(&json!({"status": "completed"}))
            .await;

        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["data"]["status"], "completed");
    }

    #[tokio::test]
    async fn test_order_status_update_by_customer_forbidden() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (_, _, customer_token, _, order) = setup_order(&server).await;
        let order_id = order["data"]["id"].as_i64().unwrap();

        let response = server
            .patch(&format!("/api/v1/orders/{}", order_id))
            .add_header(AUTHORIZATION, token(&customer_token))
            .json(&json!({"status": "completed"}))
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_order_status_update_invalid_value() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (business_token, _, _, _, order) = setup_order(&server).await;
        let order_id = order["data"]["id"].as_i64().unwrap();

        let response = server
            .patch(&format!("/api/v1/orders/{}", order_id))
            .add_header(AUTHORIZATION, token(&business_token))
            .json(&json!({"status": "shipped"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code"], "INVALID_STATUS");
    }

    #[tokio::test]
    async fn test_order_delete_staff_only() {
        let (server, state) = setup_test_server_with_state().await;

        let (business_token, _, _, _, order) = setup_order(&server).await;
        let order_id = order["data"]["id"].as_i64().unwrap();

        server
            .delete(&format!("/api/v1/orders/{}", order_id))
            .add_header(AUTHORIZATION, token(&business_token))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let (staff_token, _) = create_staff_user(&state.db, "order_remover").await;
        server
            .delete(&format!("/api/v1/orders/{}", order_id))
            .add_header(AUTHORIZATION, token(&staff_token))
            .await
            .assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_order_counts() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (business_token, business_id, customer_token, _, order) = setup_order(&server).await;
        let first_order_id = order["data"]["id"].as_i64().unwrap();

        // Second order on another tier, left in progress
        let offers: Value = server.get("/api/v1/offers").await.json();
        let basic_ref_id = offers["data"]["results"][0]["details"][0]["id"].as_i64().unwrap();
        server
            .post("/api/v1/orders")
            .add_header(AUTHORIZATION, token(&customer_token))
            .json(&json!({"offer_detail_id": basic_ref_id}))
            .await
            .assert_status(StatusCode::CREATED);

        // Complete the first one
        server
            .patch(&format!("/api/v1/orders/{}", first_order_id))
            .add_header(AUTHORIZATION, token(&business_token))
            .json(&json!({"status": "completed"}))
            .await
            .assert_status(StatusCode::OK);

        let body: Value = server
            .get(&format!("/api/v1/order-count/{}", business_id))
            .add_header(AUTHORIZATION, token(&customer_token))
            .await
            .json();
        assert_eq!(body["data"]["order_count"], 1);

        let body: Value = server
            .get(&format!("/api/v1/completed-order-count/{}", business_id))
            .add_header(AUTHORIZATION, token(&customer_token))
            .await
            .json();
        assert_eq!(body["data"]["completed_order_count"], 1);
    }

    #[tokio::test]
    async fn test_order_count_target_validation() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (auth_token, customer_id) = register(&server, "counted_customer", "customer").await;

        // Unknown user
        server
            .get("/api/v1/order-count/99999")
            .add_header(AUTHORIZATION, token(&auth_token))
            .await
            .assert_status(StatusCode::NOT_FOUND);

        // Known user, but not a business profile
        let response = server
            .get(&format!("/api/v1/order-count/{}", customer_id))
            .add_header(AUTHORIZATION, token(&auth_token))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
        let body: Value = response.json();
        assert_eq!(body["code"], "NOT_A_BUSINESS_USER");
    }

    // ---- Reviews ----

    #[tokio::test]
    async fn test_create_review() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (_, business_id) = register(&server, "reviewed_business", "business").await;
        let (customer_token, customer_id) = register(&server, "reviewing_customer", "customer").await;

        let response = server
            .post("/api/v1/reviews")
            .add_header(AUTHORIZATION, token(&customer_token))
            .json(&json!({
                "business_user": business_id,
                "rating": 4,
                "description": "Solid work, quick turnaround",
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["data"]["business_user"], business_id);
        assert_eq!(body["data"]["reviewer"], customer_id);
        assert_eq!(body["data"]["rating"], 4);
    }

    #[tokio::test]
    async fn test_duplicate_review_rejected() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (_, business_id) = register(&server, "once_reviewed", "business").await;
        let (customer_token, _) = register(&server, "repeat_reviewer", "customer").await;

        let payload = json!({"business_user": business_id, "rating": 5, "description": "Great"});
        server
            .post("/api/v1/reviews")
            .add_header(AUTHORIZATION, token(&customer_token))
            .json(&payload)
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post("/api/v1/reviews")
            .add_header(AUTHORIZATION, token(&customer_token))
            .json(&payload)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code"], "DUPLICATE_REVIEW");
    }

    #[tokio::test]
    async fn test_review_rating_bounds() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (_, business_id) = register(&server, "bounded_business", "business").await;
        let (customer_token, _) = register(&server, "harsh_customer", "customer").await;

        for rating in [0, 6] {
            let response = server
                .post("/api/v1/reviews")
                .add_header(AUTHORIZATION, token(&customer_token))
                .json(&json!({"business_user": business_id, "rating": rating, "description": ""}))
                .await;
            response.assert_status(StatusCode::BAD_REQUEST);
            let body: Value = response.json();
            assert!(body["fields"]["rating"].is_string());
        }
    }

    #[tokio::test]
    async fn test_review_target_must_be_business() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (_, customer_target_id) = register(&server, "reviewed_customer", "customer").await;
        let (customer_token, _) = register(&server, "confused_customer", "customer").await;

        let response = server
            .post("/api/v1/reviews")
            .add_header(AUTHORIZATION, token(&customer_token))
            .json(&json!({"business_user": customer_target_id, "rating": 3, "description": ""}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["fields"]["business_user"].is_string());
    }

    #[tokio::test]
    async fn test_review_by_business_forbidden() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (_, target_id) = register(&server, "target_business", "business").await;
        let (business_token, _) = register(&server, "rival_business", "business").await;

        let response = server
            .post("/api/v1/reviews")
            .add_header(AUTHORIZATION, token(&business_token))
            .json(&json!({"business_user": target_id, "rating": 1, "description": "rival"}))
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_review_list_filters_and_ordering() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (_, first_business) = register(&server, "first_reviewed", "business").await;
        let (_, second_business) = register(&server, "second_reviewed", "business").await;
        let (customer_token, reviewer_id) = register(&server, "list_reviewer", "customer").await;

        server
            .post("/api/v1/reviews")
            .add_header(AUTHORIZATION, token(&customer_token))
            .json(&json!({"business_user": first_business, "rating": 2, "description": "meh"}))
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post("/api/v1/reviews")
            .add_header(AUTHORIZATION, token(&customer_token))
            .json(&json!({"business_user": second_business, "rating": 5, "description": "great"}))
            .await
            .assert_status(StatusCode::CREATED);

        // Anonymous listing works
        let body: Value = server
            .get(&format!("/api/v1/reviews?business_user_id={first_business}"))
            .await
            .json();
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["rating"], 2);

        let body: Value = server
            .get(&format!("/api/v1/reviews?reviewer_id={reviewer_id}&ordering=-rating"))
            .await
            .json();
        let rows = body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["rating"], 5);
        assert_eq!(rows[1]["rating"], 2);
    }

    #[tokio::test]
    async fn test_review_update_and_delete_permissions() {
        let (server, state) = setup_test_server_with_state().await;

        let (_, business_id) = register(&server, "updatable_business", "business").await;
        let (reviewer_token, _) = register(&server, "updating_reviewer", "customer").await;
        let (other_token, _) = register(&server, "other_customer", "customer").await;

        let created: Value = server
            .post("/api/v1/reviews")
            .add_header(AUTHORIZATION, token(&reviewer_token))
            .json(&json!({"business_user": business_id, "rating": 3, "description": "ok"}))
            .await
            .json();
        let review_id = created["data"]["id"].as_i64().unwrap();

        // Someone else may not touch it
        server
            .patch(&format!("/api/v1/reviews/{}", review_id))
            .add_header(AUTHORIZATION, token(&other_token))
            .json(&json!({"rating": 1}))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        // The reviewer may
        let body: Value = server
            .patch(&format!("/api/v1/reviews/{}", review_id))
            .add_header(AUTHORIZATION, token(&reviewer_token))
            .json(&json!({"rating": 4, "description": "better than I thought"}))
            .await
            .json();
        assert_eq!(body["data"]["rating"], 4);

        // Staff may delete
        let (staff_token, _) = create_staff_user(&state.db, "review_admin").await;
        server
            .delete(&format!("/api/v1/reviews/{}", review_id))
            .add_header(AUTHORIZATION, token(&staff_token))
            .await
            .assert_status(StatusCode::OK);
        server
            .get(&format!("/api/v1/reviews/{}", review_id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    // ---- Base info ----

    #[tokio::test]
    async fn test_base_info_empty_platform() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server.get("/api/v1/base-info").await;

        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["data"]["review_count"], 0);
        assert_eq!(body["data"]["average_rating"], 0.0);
        assert_eq!(body["data"]["business_profile_count"], 0);
        assert_eq!(body["data"]["offer_count"], 0);
    }

    #[tokio::test]
    async fn test_base_info_aggregates() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (business_token, business_id) = register(&server, "info_business", "business").await;
        let (customer_token, _) = register(&server, "info_customer", "customer").await;
        let (second_customer_token, _) = register(&server, "second_info_customer", "customer").await;
        create_offer(&server, &business_token, "Counted offer").await;

        // Ratings 4 and 5 average to 4.5
        server
            .post("/api/v1/reviews")
            .add_header(AUTHORIZATION, token(&customer_token))
            .json(&json!({"business_user": business_id, "rating": 4, "description": ""}))
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post("/api/v1/reviews")
            .add_header(AUTHORIZATION, token(&second_customer_token))
            .json(&json!({"business_user": business_id, "rating": 5, "description": ""}))
            .await
            .assert_status(StatusCode::CREATED);

        let body: Value = server.get("/api/v1/base-info").await.json();
        assert_eq!(body["data"]["review_count"], 2);
        assert_eq!(body["data"]["average_rating"], 4.5);
        assert_eq!(body["data"]["business_profile_count"], 1);
        assert_eq!(body["data"]["offer_count"], 1);
    }

    // ---- Full marketplace flow ----

    #[tokio::test]
    async fn test_marketplace_end_to_end() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        // A business and a customer sign up
        let (business_token, business_id) = register(&server, "flow_business", "business").await;
        let (customer_token, _) = register(&server, "flow_customer", "customer").await;

        // The business publishes a three-tier offer
        let created = create_offer(&server, &business_token, "Full branding package").await;
        let premium_id = created["data"]["details"][2]["id"].as_i64().unwrap();

        // The customer browses and sees the aggregates
        let offers: Value = server.get("/api/v1/offers").await.json();
        assert_eq!(offers["data"]["count"], 1);
        assert_eq!(
            decimal(&offers["data"]["results"][0]["min_price"]),
            Decimal::from_str("50.00").unwrap()
        );

        // They order the premium tier
        let order: Value = server
            .post("/api/v1/orders")
            .add_header(AUTHORIZATION, token(&customer_token))
            .json(&json!({"offer_detail_id": premium_id}))
            .await
            .json();
        let order_id = order["data"]["id"].as_i64().unwrap();
        assert_eq!(order["data"]["status"], "in_progress");

        // The business delivers and completes the order
        server
            .patch(&format!("/api/v1/orders/{}", order_id))
            .add_header(AUTHORIZATION, token(&business_token))
            .json(&json!({"status": "completed"}))
            .await
            .assert_status(StatusCode::OK);

        let counts: Value = server
            .get(&format!("/api/v1/completed-order-count/{}", business_id))
            .add_header(AUTHORIZATION, token(&customer_token))
            .await
            .json();
        assert_eq!(counts["data"]["completed_order_count"], 1);

        // The happy customer leaves a five-star review
        server
            .post("/api/v1/reviews")
            .add_header(AUTHORIZATION, token(&customer_token))
            .json(&json!({
                "business_user": business_id,
                "rating": 5,
                "description": "Exactly what we needed",
            }))
            .await
            .assert_status(StatusCode::CREATED);

        // The platform numbers reflect all of it
        let info: Value = server.get("/api/v1/base-info").await.json();
        assert_eq!(info["data"]["review_count"], 1);
        assert_eq!(info["data"]["average_rating"], 5.0);
        assert_eq!(info["data"]["business_profile_count"], 1);
        assert_eq!(info["data"]["offer_count"], 1);
    }
}
