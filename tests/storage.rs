// Contract tests against the raw storage traits, run over both
// realizations so the memory and sqlite backends stay interchangeable.

mod common;

use common::{contexts, new_film, new_user};
use filmgraph::models::{FriendshipStatus, NewUser, UserPatch};
use filmgraph::AppError;

#[tokio::test]
async fn add_friend_edge_is_an_upsert() {
    for ctx in contexts().await {
        ctx.relationships
            .add_friend_edge(1, 2, FriendshipStatus::NotConfirmed)
            .await
            .unwrap();
        ctx.relationships
            .add_friend_edge(1, 2, FriendshipStatus::Confirmed)
            .await
            .unwrap();

        assert_eq!(
            ctx.relationships
                .friend_ids_of(1, Some(FriendshipStatus::Confirmed))
                .await
                .unwrap(),
            vec![2],
            "backend {}: second add must overwrite the status",
            ctx.backend
        );
        assert!(ctx
            .relationships
            .friend_ids_of(1, Some(FriendshipStatus::NotConfirmed))
            .await
            .unwrap()
            .is_empty());
    }
}

#[tokio::test]
async fn update_friend_status_requires_an_edge() {
    for ctx in contexts().await {
        let result = ctx
            .relationships
            .update_friend_status(1, 2, FriendshipStatus::Confirmed)
            .await;
        assert!(
            matches!(result, Err(AppError::NotFound(_))),
            "backend {}",
            ctx.backend
        );
    }
}

#[tokio::test]
async fn remove_friend_edge_reports_whether_it_removed() {
    for ctx in contexts().await {
        ctx.relationships
            .add_friend_edge(1, 2, FriendshipStatus::NotConfirmed)
            .await
            .unwrap();
        assert!(ctx.relationships.remove_friend_edge(1, 2).await.unwrap());
        // Idempotent second call.
        assert!(!ctx.relationships.remove_friend_edge(1, 2).await.unwrap());
    }
}

#[tokio::test]
async fn remove_all_edges_clears_both_directions() {
    for ctx in contexts().await {
        ctx.relationships
            .add_friend_edge(1, 2, FriendshipStatus::Confirmed)
            .await
            .unwrap();
        ctx.relationships
            .add_friend_edge(3, 1, FriendshipStatus::Confirmed)
            .await
            .unwrap();
        ctx.relationships
            .add_friend_edge(3, 4, FriendshipStatus::Confirmed)
            .await
            .unwrap();

        ctx.relationships.remove_all_edges_of(1).await.unwrap();

        assert!(ctx
            .relationships
            .friend_ids_of(1, None)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            ctx.relationships.friend_ids_of(3, None).await.unwrap(),
            vec![4],
            "backend {}: unrelated edges must survive",
            ctx.backend
        );
    }
}

#[tokio::test]
async fn friend_ids_filter_by_status() {
    for ctx in contexts().await {
        ctx.relationships
            .add_friend_edge(1, 2, FriendshipStatus::Confirmed)
            .await
            .unwrap();
        ctx.relationships
            .add_friend_edge(1, 3, FriendshipStatus::NotConfirmed)
            .await
            .unwrap();
        ctx.relationships
            .add_friend_edge(1, 4, FriendshipStatus::Declined)
            .await
            .unwrap();

        assert_eq!(
            ctx.relationships
                .friend_ids_of(1, Some(FriendshipStatus::Confirmed))
                .await
                .unwrap(),
            vec![2]
        );
        assert_eq!(
            ctx.relationships.friend_ids_of(1, None).await.unwrap(),
            vec![2, 3, 4],
            "backend {}",
            ctx.backend
        );
    }
}

#[tokio::test]
async fn common_friend_ids_ignores_status() {
    for ctx in contexts().await {
        ctx.relationships
            .add_friend_edge(1, 5, FriendshipStatus::NotConfirmed)
            .await
            .unwrap();
        ctx.relationships
            .add_friend_edge(2, 5, FriendshipStatus::Confirmed)
            .await
            .unwrap();
        ctx.relationships
            .add_friend_edge(1, 6, FriendshipStatus::Confirmed)
            .await
            .unwrap();

        assert_eq!(
            ctx.relationships.common_friend_ids(1, 2).await.unwrap(),
            vec![5],
            "backend {}: the raw primitive intersects regardless of status",
            ctx.backend
        );
    }
}

#[tokio::test]
async fn likes_are_idempotent_at_the_store_level() {
    for ctx in contexts().await {
        ctx.relationships.add_like(7, 1).await.unwrap();
        ctx.relationships.add_like(7, 1).await.unwrap();
        assert_eq!(ctx.relationships.liked_user_ids_of(1).await.unwrap(), vec![7]);

        ctx.relationships.remove_like(7, 1).await.unwrap();
        ctx.relationships.remove_like(7, 1).await.unwrap();
        assert!(ctx
            .relationships
            .liked_user_ids_of(1)
            .await
            .unwrap()
            .is_empty());
    }
}

#[tokio::test]
async fn top_film_ids_include_zero_like_films_last() {
    for ctx in contexts().await {
        let f1 = ctx.catalog.create_film(new_film("A")).await.unwrap();
        let f2 = ctx.catalog.create_film(new_film("B")).await.unwrap();
        let f3 = ctx.catalog.create_film(new_film("C")).await.unwrap();

        ctx.relationships.add_like(10, f2.id).await.unwrap();
        ctx.relationships.add_like(11, f2.id).await.unwrap();
        ctx.relationships.add_like(10, f3.id).await.unwrap();

        assert_eq!(
            ctx.relationships.top_film_ids_by_likes(10).await.unwrap(),
            vec![f2.id, f3.id, f1.id],
            "backend {}",
            ctx.backend
        );
        assert_eq!(
            ctx.relationships.top_film_ids_by_likes(1).await.unwrap(),
            vec![f2.id]
        );
    }
}

#[tokio::test]
async fn get_users_by_ids_preserves_order_and_skips_misses() {
    for ctx in contexts().await {
        let u1 = ctx.catalog.create_user(new_user("a@x.com", "a")).await.unwrap();
        let u2 = ctx.catalog.create_user(new_user("b@x.com", "b")).await.unwrap();
        let u3 = ctx.catalog.create_user(new_user("c@x.com", "c")).await.unwrap();

        let users = ctx
            .entities
            .get_users_by_ids(&[u3.id, 999, u1.id, u2.id])
            .await
            .unwrap();
        assert_eq!(
            users.iter().map(|u| u.id).collect::<Vec<_>>(),
            vec![u3.id, u1.id, u2.id],
            "backend {}",
            ctx.backend
        );
    }
}

#[tokio::test]
async fn duplicate_email_and_login_conflict() {
    for ctx in contexts().await {
        ctx.catalog
            .create_user(new_user("dup@x.com", "first"))
            .await
            .unwrap();

        assert!(matches!(
            ctx.catalog.create_user(new_user("dup@x.com", "second")).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            ctx.catalog.create_user(new_user("other@x.com", "first")).await,
            Err(AppError::Conflict(_))
        ));
    }
}

#[tokio::test]
async fn blank_name_falls_back_to_login() {
    for ctx in contexts().await {
        let user = ctx
            .catalog
            .create_user(NewUser {
                name: Some("   ".to_string()),
                ..new_user("n@x.com", "nickname")
            })
            .await
            .unwrap();
        assert_eq!(user.name, "nickname", "backend {}", ctx.backend);
    }
}

#[tokio::test]
async fn film_genres_are_deduplicated_and_sorted() {
    for ctx in contexts().await {
        let mut req = new_film("Genre Soup");
        req.genre_ids = vec![2, 1, 2, 1];
        let film = ctx.catalog.create_film(req).await.unwrap();
        assert_eq!(
            film.genres.iter().map(|g| g.id).collect::<Vec<_>>(),
            vec![1, 2],
            "backend {}",
            ctx.backend
        );
    }
}

#[tokio::test]
async fn unknown_mpa_or_genre_is_rejected() {
    for ctx in contexts().await {
        let mut req = new_film("Unrated");
        req.mpa_id = 42;
        assert!(matches!(
            ctx.catalog.create_film(req).await,
            Err(AppError::NotFound(_))
        ));

        let mut req = new_film("Genreless");
        req.genre_ids = vec![42];
        assert!(matches!(
            ctx.catalog.create_film(req).await,
            Err(AppError::NotFound(_))
        ));
    }
}

#[tokio::test]
async fn user_ids_are_never_reused() {
    for ctx in contexts().await {
        let u1 = ctx.catalog.create_user(new_user("a@x.com", "a")).await.unwrap();
        let u2 = ctx.catalog.create_user(new_user("b@x.com", "b")).await.unwrap();
        ctx.catalog.delete_user(u2.id).await.unwrap();
        let u3 = ctx.catalog.create_user(new_user("c@x.com", "c")).await.unwrap();

        assert!(u3.id > u2.id, "backend {}", ctx.backend);
        assert!(u2.id > u1.id);
    }
}

#[tokio::test]
async fn update_user_patches_only_provided_fields() {
    for ctx in contexts().await {
        let user = ctx
            .catalog
            .create_user(new_user("old@x.com", "old_login"))
            .await
            .unwrap();

        let updated = ctx
            .catalog
            .update_user(UserPatch {
                id: user.id,
                email: Some("new@x.com".to_string()),
                ..UserPatch::default()
            })
            .await
            .unwrap();

        assert_eq!(updated.email, "new@x.com");
        assert_eq!(updated.login, "old_login", "backend {}", ctx.backend);
        assert_eq!(updated.birthday, user.birthday);
    }
}
