mod common;

use common::{contexts, new_film, new_user};
use filmgraph::models::{EntityId, Film, User};
use filmgraph::AppError;

async fn create_user(ctx: &common::TestContext, email: &str, login: &str) -> User {
    ctx.catalog
        .create_user(new_user(email, login))
        .await
        .expect("create user")
}

async fn create_film(ctx: &common::TestContext, name: &str) -> Film {
    ctx.catalog
        .create_film(new_film(name))
        .await
        .expect("create film")
}

fn film_ids(films: &[Film]) -> Vec<EntityId> {
    films.iter().map(|f| f.id).collect()
}

#[tokio::test]
async fn like_is_idempotent() {
    for ctx in contexts().await {
        let u = create_user(&ctx, "u@example.com", "user").await;
        let f = create_film(&ctx, "Heat").await;

        ctx.popularity.like_film(u.id, f.id).await.unwrap();
        ctx.popularity.like_film(u.id, f.id).await.unwrap();

        let likers = ctx.popularity.get_likers(f.id).await.unwrap();
        assert_eq!(
            likers.iter().map(|u| u.id).collect::<Vec<_>>(),
            vec![u.id],
            "backend {}: double like must not duplicate",
            ctx.backend
        );
    }
}

#[tokio::test]
async fn unlike_of_an_unliked_pair_is_a_noop() {
    for ctx in contexts().await {
        let u = create_user(&ctx, "u@example.com", "user").await;
        let f = create_film(&ctx, "Heat").await;

        ctx.popularity.unlike_film(u.id, f.id).await.unwrap();
        assert!(ctx.popularity.get_likers(f.id).await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn like_requires_both_entities() {
    for ctx in contexts().await {
        let u = create_user(&ctx, "u@example.com", "user").await;
        let f = create_film(&ctx, "Heat").await;

        assert!(matches!(
            ctx.popularity.like_film(u.id, 9999).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            ctx.popularity.like_film(9999, f.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            ctx.popularity.get_likers(9999).await,
            Err(AppError::NotFound(_))
        ));
    }
}

#[tokio::test]
async fn ranking_is_deterministic_with_ties_broken_by_id() {
    for ctx in contexts().await {
        let users: Vec<User> = {
            let mut users = Vec::new();
            for i in 0..3 {
                users.push(
                    create_user(&ctx, &format!("u{}@example.com", i), &format!("user{}", i)).await,
                );
            }
            users
        };
        let f1 = create_film(&ctx, "First").await;
        let f2 = create_film(&ctx, "Second").await;
        let f3 = create_film(&ctx, "Third").await;

        // f1 and f2 tie on three likes each, f3 trails with one.
        for u in &users {
            ctx.popularity.like_film(u.id, f1.id).await.unwrap();
            ctx.popularity.like_film(u.id, f2.id).await.unwrap();
        }
        ctx.popularity.like_film(users[0].id, f3.id).await.unwrap();

        let top = ctx.popularity.top_liked(2).await.unwrap();
        assert_eq!(
            film_ids(&top),
            vec![f1.id, f2.id],
            "backend {}: tie must break by ascending film id",
            ctx.backend
        );

        // Repeated calls with unchanged data return the same ranking.
        let again = ctx.popularity.top_liked(2).await.unwrap();
        assert_eq!(film_ids(&again), vec![f1.id, f2.id]);
    }
}

#[tokio::test]
async fn top_liked_rejects_non_positive_count() {
    for ctx in contexts().await {
        assert!(matches!(
            ctx.popularity.top_liked(0).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            ctx.popularity.top_liked(-5).await,
            Err(AppError::BadRequest(_))
        ));
    }
}

#[tokio::test]
async fn top_liked_caps_at_catalog_size() {
    for ctx in contexts().await {
        for name in ["One", "Two", "Three"] {
            create_film(&ctx, name).await;
        }
        let top = ctx.popularity.top_liked(100).await.unwrap();
        assert_eq!(top.len(), 3, "backend {}", ctx.backend);
    }
}

#[tokio::test]
async fn zero_like_films_rank_after_liked_ones() {
    for ctx in contexts().await {
        let u = create_user(&ctx, "u@example.com", "user").await;
        let f1 = create_film(&ctx, "Quiet").await;
        let f2 = create_film(&ctx, "Popular").await;
        let f3 = create_film(&ctx, "Obscure").await;

        ctx.popularity.like_film(u.id, f2.id).await.unwrap();

        let top = ctx.popularity.top_liked(10).await.unwrap();
        assert_eq!(
            film_ids(&top),
            vec![f2.id, f1.id, f3.id],
            "backend {}: zero-like films sort after liked ones, by ascending id",
            ctx.backend
        );
    }
}

#[tokio::test]
async fn user_deletion_clears_liker_lists() {
    for ctx in contexts().await {
        let u1 = create_user(&ctx, "u1@example.com", "user1").await;
        let u2 = create_user(&ctx, "u2@example.com", "user2").await;
        let f = create_film(&ctx, "Heat").await;
        ctx.popularity.like_film(u1.id, f.id).await.unwrap();
        ctx.popularity.like_film(u2.id, f.id).await.unwrap();

        ctx.catalog.delete_user(u1.id).await.unwrap();

        let likers = ctx.popularity.get_likers(f.id).await.unwrap();
        assert_eq!(
            likers.iter().map(|u| u.id).collect::<Vec<_>>(),
            vec![u2.id],
            "backend {}",
            ctx.backend
        );
    }
}

#[tokio::test]
async fn film_deletion_clears_its_likes() {
    for ctx in contexts().await {
        let u = create_user(&ctx, "u@example.com", "user").await;
        let f = create_film(&ctx, "Ephemeral").await;
        ctx.popularity.like_film(u.id, f.id).await.unwrap();

        ctx.catalog.delete_film(f.id).await.unwrap();

        assert!(matches!(
            ctx.popularity.get_likers(f.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(ctx.popularity.top_liked(10).await.unwrap().is_empty());
    }
}
