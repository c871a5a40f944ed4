use folio_model::{parse_email, parse_username, CompanyPatch, ProfilePatch, User};
use folio_store::{Database, NewCompany, NewPortfolioItem, NewTestimonial, NewUser, StoreError};
use tempfile::TempDir;

fn mk_db() -> (TempDir, Database) {
    let dir = TempDir::new().expect("tempdir");
    let db = Database::new(dir.path().join("folio.sqlite"));
    (dir, db)
}

async fn seed_user(db: &Database, email: &str, name: &str) -> User {
    let username = db.allocate_username(name).await.expect("allocate username");
    db.create_user(NewUser {
        email: parse_email(email).expect("email"),
        name: name.to_string(),
        image: String::new(),
        username,
    })
    .await
    .expect("create user")
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let (_dir, db) = mk_db();
    seed_user(&db, "admin@example.com", "John Doe").await;
    let username = db.allocate_username("Other Name").await.expect("allocate");
    let err = db
        .create_user(NewUser {
            email: parse_email("admin@example.com").expect("email"),
            name: "Other Name".to_string(),
            image: String::new(),
            username,
        })
        .await
        .expect_err("duplicate email must be rejected");
    assert!(matches!(err, StoreError::Conflict(_)));
}

#[tokio::test]
async fn username_allocation_probes_sequentially() {
    let (_dir, db) = mk_db();
    let first = db.allocate_username("John Doe").await.expect("first slug");
    assert_eq!(first.as_str(), "john-doe");
    db.create_user(NewUser {
        email: parse_email("john@example.com").expect("email"),
        name: "John Doe".to_string(),
        image: String::new(),
        username: first,
    })
    .await
    .expect("create user");

    let second = db.allocate_username("John Doe").await.expect("second slug");
    assert_eq!(second.as_str(), "john-doe-1");
}

#[tokio::test]
async fn username_allocation_falls_back_for_empty_names() {
    let (_dir, db) = mk_db();
    let slug = db.allocate_username("").await.expect("fallback slug");
    assert_eq!(slug.as_str(), "user");
}

#[tokio::test]
async fn testimonials_always_land_unapproved_and_public_view_filters() {
    let (_dir, db) = mk_db();
    let owner = seed_user(&db, "owner@example.com", "Owner").await;

    let t = db
        .create_testimonial(
            owner.id,
            NewTestimonial {
                author_name: "Visitor".to_string(),
                author_image: String::new(),
                text: "Great work".to_string(),
            },
        )
        .await
        .expect("create testimonial");
    assert!(!t.approved);

    assert!(db
        .approved_testimonials(owner.id)
        .await
        .expect("approved list")
        .is_empty());

    db.set_testimonial_approved(owner.id, t.id, true)
        .await
        .expect("approve");
    let approved = db
        .approved_testimonials(owner.id)
        .await
        .expect("approved list");
    assert_eq!(approved.len(), 1);
    assert!(approved.iter().all(|t| t.approved));
}

#[tokio::test]
async fn owner_listing_sorts_pending_after_approved() {
    let (_dir, db) = mk_db();
    let owner = seed_user(&db, "owner@example.com", "Owner").await;
    let a = db
        .create_testimonial(
            owner.id,
            NewTestimonial {
                author_name: "A".to_string(),
                author_image: String::new(),
                text: "first".to_string(),
            },
        )
        .await
        .expect("create");
    db.create_testimonial(
        owner.id,
        NewTestimonial {
            author_name: "B".to_string(),
            author_image: String::new(),
            text: "second".to_string(),
        },
    )
    .await
    .expect("create");
    db.set_testimonial_approved(owner.id, a.id, true)
        .await
        .expect("approve");

    let all = db.testimonials_for_owner(owner.id).await.expect("list");
    assert_eq!(all.len(), 2);
    assert!(all[0].approved);
    assert!(!all[1].approved);
}

#[tokio::test]
async fn deletes_are_idempotent_and_owner_scoped() {
    let (_dir, db) = mk_db();
    let owner = seed_user(&db, "owner@example.com", "Owner").await;
    let stranger = seed_user(&db, "stranger@example.com", "Stranger").await;

    let item = db
        .create_portfolio_item(
            owner.id,
            NewPortfolioItem {
                title: "Site".to_string(),
                description: String::new(),
                url: String::new(),
                image_url: String::new(),
            },
        )
        .await
        .expect("create item");

    assert!(!db
        .delete_portfolio_item(owner.id, 9999)
        .await
        .expect("missing id"));
    assert!(!db
        .delete_portfolio_item(stranger.id, item.id)
        .await
        .expect("foreign id"));
    assert!(db
        .delete_portfolio_item(owner.id, item.id)
        .await
        .expect("own id"));
    assert!(!db
        .delete_portfolio_item(owner.id, item.id)
        .await
        .expect("already gone"));
}

#[tokio::test]
async fn company_update_is_owner_scoped() {
    let (_dir, db) = mk_db();
    let owner = seed_user(&db, "owner@example.com", "Owner").await;
    let stranger = seed_user(&db, "stranger@example.com", "Stranger").await;

    let company = db
        .create_company(
            owner.id,
            NewCompany {
                name: "Acme".to_string(),
                url: "https://acme.example".to_string(),
                favicon_url: String::new(),
            },
        )
        .await
        .expect("create company");

    let patch = CompanyPatch {
        name: Some("Acme Corp".to_string()),
        ..CompanyPatch::default()
    };
    let err = db
        .update_company(stranger.id, company.id, &patch)
        .await
        .expect_err("foreign update must fail");
    assert_eq!(err, StoreError::NotFound);

    let updated = db
        .update_company(owner.id, company.id, &patch)
        .await
        .expect("own update");
    assert_eq!(updated.name, "Acme Corp");
    assert_eq!(updated.url, "https://acme.example");
}

#[tokio::test]
async fn profile_patch_touches_only_supplied_fields() {
    let (_dir, db) = mk_db();
    let user = seed_user(&db, "owner@example.com", "Owner").await;

    let patch = ProfilePatch {
        headline: Some("Builder of things".to_string()),
        ..ProfilePatch::default()
    };
    let updated = db.update_profile(user.id, &patch).await.expect("patch");
    assert_eq!(updated.headline, "Builder of things");
    assert_eq!(updated.name, "Owner");
    assert_eq!(updated.username, user.username);
}

#[tokio::test]
async fn unique_index_backstops_racing_username_writes() {
    let (_dir, db) = mk_db();
    let owner = seed_user(&db, "owner@example.com", "Owner").await;
    seed_user(&db, "taken@example.com", "Taken Name").await;

    let patch = ProfilePatch {
        username: Some("taken-name".to_string()),
        ..ProfilePatch::default()
    };
    let err = db
        .update_profile(owner.id, &patch)
        .await
        .expect_err("duplicate username must be rejected");
    assert!(matches!(err, StoreError::Conflict(_)));

    let unchanged = db
        .user_by_id(owner.id)
        .await
        .expect("lookup")
        .expect("user exists");
    assert_eq!(unchanged.username, owner.username);
}

#[tokio::test]
async fn lookup_by_slug_and_email_round_trips() {
    let (_dir, db) = mk_db();
    let user = seed_user(&db, "owner@example.com", "Owner").await;

    let by_slug = db
        .user_by_username(user.username.as_str())
        .await
        .expect("by slug")
        .expect("present");
    assert_eq!(by_slug.id, user.id);

    let by_email = db
        .user_by_email(&parse_email("owner@example.com").expect("email"))
        .await
        .expect("by email")
        .expect("present");
    assert_eq!(by_email.id, user.id);

    assert!(db
        .user_by_username("no-such-slug")
        .await
        .expect("lookup")
        .is_none());

    // allocate_username output is always parseable
    assert!(parse_username(by_slug.username.as_str()).is_ok());
}
