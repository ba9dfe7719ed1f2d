use serde_json::json;

use crate::common::{PASSWORD, TestApp, routes, sparrow};

mod register {
    use super::*;

    #[tokio::test]
    async fn register_returns_the_new_user() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(
                routes::REGISTER,
                &json!({ "email": "a@x.com", "password": PASSWORD }),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["email"], "a@x.com");
        assert!(res.body["id"].is_number());
        assert!(res.body.get("password").is_none());
    }

    #[tokio::test]
    async fn email_is_normalized() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(
                routes::REGISTER,
                &json!({ "email": "  A@X.com ", "password": PASSWORD }),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["email"], "a@x.com");
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let app = TestApp::spawn().await;
        app.create_authenticated_user("a@x.com").await;

        let res = app
            .post_json(
                routes::REGISTER,
                &json!({ "email": "A@x.com", "password": PASSWORD }),
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "EMAIL_TAKEN");
    }

    #[tokio::test]
    async fn malformed_email_is_rejected() {
        let app = TestApp::spawn().await;

        for email in ["", "no-at-sign", "@x.com", "a@", "a b@x.com"] {
            let res = app
                .post_json(
                    routes::REGISTER,
                    &json!({ "email": email, "password": PASSWORD }),
                )
                .await;
            assert_eq!(res.status, 400, "accepted email {email:?}");
            assert_eq!(res.body["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(
                routes::REGISTER,
                &json!({ "email": "a@x.com", "password": "short" }),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(routes::REGISTER, &json!({ "email": "a@x.com" }))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn login_returns_a_token() {
        let app = TestApp::spawn().await;
        app.create_authenticated_user("a@x.com").await;

        let res = app
            .post_json(
                routes::LOGIN,
                &json!({ "email": "a@x.com", "password": PASSWORD }),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["token"].as_str().is_some_and(|t| !t.is_empty()));
        assert_eq!(res.body["email"], "a@x.com");
        assert!(res.body["expires_at"].is_string());
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;
        app.create_authenticated_user("a@x.com").await;

        let res = app
            .post_json(
                routes::LOGIN,
                &json!({ "email": "a@x.com", "password": "wrongpassword" }),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn unknown_user_is_indistinguishable_from_wrong_password() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(
                routes::LOGIN,
                &json!({ "email": "ghost@x.com", "password": PASSWORD }),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn each_login_opens_a_distinct_session() {
        let app = TestApp::spawn().await;
        let first = app.create_authenticated_user("a@x.com").await;
        let second = app.login("a@x.com").await;

        assert_ne!(app.session_id(&first), app.session_id(&second));
        assert_eq!(app.get_with_token(routes::ME, &first).await.status, 200);
        assert_eq!(app.get_with_token(routes::ME, &second).await.status, 200);
    }
}

mod session {
    use super::*;

    #[tokio::test]
    async fn me_returns_the_caller() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("a@x.com").await;

        let res = app.get_with_token(routes::ME, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["email"], "a@x.com");
    }

    #[tokio::test]
    async fn missing_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::ME, "not-a-jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn logout_ends_the_session() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("a@x.com").await;

        let res = app.post_with_token(routes::LOGOUT, &token).await;
        assert_eq!(res.status, 204);

        let res = app.get_with_token(routes::ME, &token).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn logout_leaves_other_sessions_alone() {
        let app = TestApp::spawn().await;
        let first = app.create_authenticated_user("a@x.com").await;
        let second = app.login("a@x.com").await;

        app.post_with_token(routes::LOGOUT, &first).await;

        assert_eq!(app.get_with_token(routes::ME, &second).await.status, 200);
    }

    #[tokio::test]
    async fn signed_links_stop_working_after_logout() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("a@x.com").await;
        let id = app.create_bird(&token, &sparrow()).await;
        let link = app.link(&token, id, "increment").await;

        app.post_with_token(routes::LOGOUT, &token).await;
        let res = app.get_with_token(&link, &token).await;
        assert_eq!(res.status, 401);

        let fresh = app.login("a@x.com").await;
        let res = app.get_with_token(&link, &fresh).await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "SIGNATURE_INVALID");

        assert_eq!(app.find_bird(id).await.unwrap().sighting_count, 1);
    }
}
