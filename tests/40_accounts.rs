mod common;

use anyhow::Result;

use eduvia_api::auth::{verify_token, TokenUse};
use eduvia_api::services::admin::AdminCredentials;
use eduvia_api::services::school::{SchoolCredentials, SchoolRegistration, SchoolUpdate};
use eduvia_api::services::student::{PasswordReset, StudentCredentials, StudentRegistration};
use eduvia_api::services::ServiceError;
use eduvia_api::store::{collections, DocumentStore, CENTRAL_NAMESPACE};

fn school_registration(name: &str, email: &str) -> SchoolRegistration {
    SchoolRegistration {
        name: name.to_string(),
        email: email.to_string(),
        password: "hunter22".to_string(),
        experience: None,
        courses_offered: vec![],
        address: None,
        official_contact: None,
    }
}

#[tokio::test]
async fn school_registration_and_login_roundtrip() -> Result<()> {
    let state = common::test_state().await;

    let school = state
        .schools
        .register(school_registration("Math Academy", "admin@mathacademy.in"))
        .await?;
    assert!(!school.is_verified);
    assert!(school.sub_domain.is_none());

    let session = state
        .schools
        .login(SchoolCredentials {
            email: "admin@mathacademy.in".to_string(),
            password: "hunter22".to_string(),
        })
        .await?;
    assert_eq!(session.school.id, school.id);

    let claims = verify_token(&session.access_token).expect("valid token");
    assert_eq!(claims.sub, school.id);
    assert_eq!(claims.role, "school");
    assert_eq!(claims.token_use, TokenUse::Access);
    Ok(())
}

#[tokio::test]
async fn duplicate_school_email_conflicts() -> Result<()> {
    let state = common::test_state().await;

    state
        .schools
        .register(school_registration("Math Academy", "admin@mathacademy.in"))
        .await?;
    let err = state
        .schools
        .register(school_registration("Other Academy", "admin@mathacademy.in"))
        .await
        .expect_err("same email");
    assert!(matches!(err, ServiceError::Conflict(_)));
    Ok(())
}

#[tokio::test]
async fn wrong_password_is_unauthorized() -> Result<()> {
    let state = common::test_state().await;

    state
        .schools
        .register(school_registration("Math Academy", "admin@mathacademy.in"))
        .await?;
    let err = state
        .schools
        .login(SchoolCredentials {
            email: "admin@mathacademy.in".to_string(),
            password: "wrong".to_string(),
        })
        .await
        .expect_err("bad password");
    assert!(matches!(err, ServiceError::Unauthorized(_)));
    Ok(())
}

#[tokio::test]
async fn assigning_a_subdomain_bootstraps_the_tenant() -> Result<()> {
    let state = common::test_state().await;

    let school = state
        .schools
        .register(school_registration("Math Academy", "admin@mathacademy.in"))
        .await?;

    let updated = state
        .schools
        .update_school(
            school.id,
            SchoolUpdate {
                is_verified: Some(true),
                sub_domain: Some("mathacademy.eduvia.space".to_string()),
                ..Default::default()
            },
        )
        .await?;
    assert!(updated.is_verified);

    // The tenant namespace exists now; course creation works immediately
    let details = state
        .composition
        .create_course(
            "mathacademy",
            common::course("Algebra", school.id, vec![]),
        )
        .await?;
    assert_eq!(details.course_name, "Algebra");

    let found = state
        .schools
        .get_by_subdomain("mathacademy.eduvia.space")
        .await?;
    assert_eq!(found.id, school.id);

    // Explicit re-init reports the namespace as already present
    let init = state.schools.init_tenant("mathacademy.eduvia.space").await?;
    assert_eq!(init.slug, "mathacademy");
    assert_eq!(init.database, "school_mathacademy");
    assert!(init.already_initialized);
    Ok(())
}

#[tokio::test]
async fn admin_registration_and_login_roundtrip() -> Result<()> {
    let state = common::test_state().await;

    let admin = state
        .admins
        .register(AdminCredentials {
            email: "ops@eduvia.space".to_string(),
            password: "hunter22".to_string(),
        })
        .await?;

    let err = state
        .admins
        .register(AdminCredentials {
            email: "ops@eduvia.space".to_string(),
            password: "another1".to_string(),
        })
        .await
        .expect_err("same email");
    assert!(matches!(err, ServiceError::Conflict(_)));

    let err = state
        .admins
        .login(AdminCredentials {
            email: "ops@eduvia.space".to_string(),
            password: "wrong".to_string(),
        })
        .await
        .expect_err("bad password");
    assert!(matches!(err, ServiceError::Unauthorized(_)));

    let session = state
        .admins
        .login(AdminCredentials {
            email: "ops@eduvia.space".to_string(),
            password: "hunter22".to_string(),
        })
        .await?;
    assert_eq!(session.admin.id, admin.id);

    let claims = verify_token(&session.access_token).expect("valid token");
    assert_eq!(claims.sub, admin.id);
    assert_eq!(claims.role, "admin");
    assert!(claims.sub_domain.is_none());
    Ok(())
}

#[tokio::test]
async fn student_password_reset_flow() -> Result<()> {
    let state = common::test_state().await;

    let student = state
        .students
        .register(StudentRegistration {
            full_name: "Priya Sharma".to_string(),
            email: "priya@example.com".to_string(),
            password: "original1".to_string(),
        })
        .await?;

    state.students.forgot_password("priya@example.com").await?;

    // The token is not serialized out; read it straight from the store
    let doc = state
        .store
        .find_by_id(CENTRAL_NAMESPACE, collections::STUDENTS, student.id)
        .await?
        .expect("student doc");
    let token = doc["resetPasswordToken"]
        .as_str()
        .expect("token stored")
        .to_string();

    let err = state
        .students
        .reset_password(PasswordReset {
            email: "priya@example.com".to_string(),
            token: "not-the-token".to_string(),
            new_password: "changed22".to_string(),
        })
        .await
        .expect_err("wrong token");
    assert!(matches!(err, ServiceError::Unauthorized(_)));

    state
        .students
        .reset_password(PasswordReset {
            email: "priya@example.com".to_string(),
            token,
            new_password: "changed22".to_string(),
        })
        .await?;

    // Old password rejected, new one accepted, token single-use
    let err = state
        .students
        .login(StudentCredentials {
            email: "priya@example.com".to_string(),
            password: "original1".to_string(),
        })
        .await
        .expect_err("old password");
    assert!(matches!(err, ServiceError::Unauthorized(_)));

    let session = state
        .students
        .login(StudentCredentials {
            email: "priya@example.com".to_string(),
            password: "changed22".to_string(),
        })
        .await?;
    assert_eq!(session.student.id, student.id);

    let doc = state
        .store
        .find_by_id(CENTRAL_NAMESPACE, collections::STUDENTS, student.id)
        .await?
        .expect("student doc");
    assert!(doc["resetPasswordToken"].is_null());
    Ok(())
}
