use std::sync::{Arc, Barrier};
use std::thread;

use matti_db::Ledger;
use matti_game::{Game, GameConfig, Outcome};
use matti_state::{FlowKind, Lane, ReviewDecision, StateStore};
use matti_types::{Media, SuggestionStatus};

const MODERATOR: i64 = 1;
const SECRET: &str = "fantamattopwd";

fn game() -> Game {
    let ledger = Ledger::open_in_memory().unwrap();
    Game::new(
        Arc::new(ledger),
        StateStore::new(),
        GameConfig {
            moderator_id: MODERATOR,
            registration_secret: SECRET.to_string(),
        },
    )
}

fn join(game: &Game, chat: i64, handle: &str) {
    assert_eq!(game.start(chat, Some(handle), None).unwrap(), Outcome::AwaitingSecret);
    assert!(matches!(game.handle_text(chat, SECRET).unwrap(), Outcome::Registered { .. }));
}

fn total(game: &Game, chat: i64) -> i64 {
    game.ledger().participant(chat).unwrap().unwrap().total_points
}

#[test]
fn registration_needs_the_secret() {
    let game = game();

    assert_eq!(game.start(10, Some("ada"), Some("Ada")).unwrap(), Outcome::AwaitingSecret);
    assert_eq!(game.handle_text(10, "nope").unwrap(), Outcome::WrongSecret);
    assert!(game.states().has(FlowKind::Password, 10));
    assert_eq!(game.begin_report(10).unwrap(), Outcome::NotRegistered);

    match game.handle_text(10, "  fantamattopwd ").unwrap() {
        Outcome::Registered { standing: Some(standing) } => {
            assert_eq!(standing.rank, 1);
            assert_eq!(standing.total_points, 0);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(game.states().is_empty());
    assert_eq!(game.start(10, Some("ada"), Some("Ada")).unwrap(), Outcome::AlreadyRegistered);
    assert_eq!(game.handle_text(10, SECRET).unwrap(), Outcome::Ignored);
}

#[test]
fn find_credits_the_reporter() {
    let game = game();
    join(&game, 10, "ada");
    join(&game, 11, "bob");
    let gufo = game.add_category(MODERATOR, "Gufo", 5).unwrap();
    let Outcome::CategoryAdded { category } = gufo else {
        panic!("unexpected {gufo:?}");
    };

    assert!(matches!(game.begin_report(10).unwrap(), Outcome::ChooseCategory { .. }));
    assert_eq!(
        game.choose_category(10, category.id).unwrap(),
        Outcome::AwaitingMedia { category: category.clone() }
    );

    match game.submit_media(10, Media::photo("file-1")).unwrap() {
        Outcome::SightingRecorded { standing, recipients, .. } => {
            let standing = standing.unwrap();
            assert_eq!((standing.rank, standing.total_points), (1, 5));
            assert_eq!(recipients, vec![10, 11]);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(total(&game, 10), 5);
    assert_eq!(total(&game, 11), 0);

    // Flow was consumed
    assert_eq!(game.submit_media(10, Media::photo("file-2")).unwrap(), Outcome::Ignored);
    assert_eq!(total(&game, 10), 5);
}

#[test]
fn weapon_hits_target_and_deletion_restores() {
    let game = game();
    join(&game, 10, "ada");
    join(&game, 11, "bob");
    game.ledger().set_points_absolute(11, 30).unwrap();
    let Outcome::CategoryAdded { category } = game.add_category(MODERATOR, "Spada", -10).unwrap() else {
        panic!("category not added");
    };

    game.choose_category(10, category.id).unwrap();
    match game.submit_media(10, Media::video("clip")).unwrap() {
        Outcome::ChooseTarget { candidates, .. } => {
            let ids: Vec<_> = candidates.iter().map(|c| c.chat_id).collect();
            assert_eq!(ids, vec![11]);
        }
        other => panic!("unexpected {other:?}"),
    }

    assert_eq!(
        game.choose_weapon_target(10, 10).unwrap(),
        Outcome::UnknownParticipant { participant: 10 }
    );
    let sighting = match game.choose_weapon_target(10, 11).unwrap() {
        Outcome::WeaponUsed { sighting, damage, target, wielder, .. } => {
            assert_eq!(damage, 10);
            assert_eq!(target.chat_id, 11);
            assert_eq!(wielder, 10);
            sighting
        }
        other => panic!("unexpected {other:?}"),
    };
    assert_eq!(total(&game, 10), 0);
    assert_eq!(total(&game, 11), 20);
    assert_eq!(game.choose_weapon_target(10, 11).unwrap(), Outcome::Expired);

    game.manage_participant(MODERATOR, 10).unwrap();
    match game.delete_sighting(MODERATOR, sighting).unwrap() {
        Outcome::SightingDeleted { remaining, .. } => assert_eq!(remaining, Some(vec![])),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(total(&game, 10), 0);
    assert_eq!(total(&game, 11), 30);
    assert_eq!(
        game.delete_sighting(MODERATOR, sighting).unwrap(),
        Outcome::UnknownSighting { sighting }
    );
}

#[test]
fn zero_point_category_is_a_find() {
    let game = game();
    join(&game, 10, "ada");
    join(&game, 11, "bob");
    let Outcome::CategoryAdded { category } = game.add_category(MODERATOR, "Nulla", 0).unwrap() else {
        panic!("category not added");
    };

    game.choose_category(10, category.id).unwrap();
    assert!(matches!(
        game.submit_media(10, Media::photo("nothing")).unwrap(),
        Outcome::SightingRecorded { .. }
    ));
    assert_eq!(game.ledger().gallery_by_category(category.id).unwrap().len(), 1);
    assert_eq!(total(&game, 10), 0);
    assert_eq!(total(&game, 11), 0);
    assert!(game.states().is_empty());
}

#[test]
fn weapon_without_victims() {
    let game = game();
    join(&game, 10, "ada");
    let Outcome::CategoryAdded { category } = game.add_category(MODERATOR, "Spada", -10).unwrap() else {
        panic!("category not added");
    };

    game.choose_category(10, category.id).unwrap();
    assert!(matches!(
        game.submit_media(10, Media::photo("p")).unwrap(),
        Outcome::NoTargets { .. }
    ));
    assert!(game.states().is_empty());
}

#[test]
fn suggestion_approved_with_notes() {
    let game = game();
    join(&game, 10, "ada");

    assert_eq!(game.begin_suggestion(10).unwrap(), Outcome::AwaitingSuggestionName);
    assert_eq!(game.handle_text(10, "   ").unwrap(), Outcome::InvalidSuggestionName);
    assert_eq!(
        game.handle_text(10, "Troll").unwrap(),
        Outcome::AwaitingSuggestionPoints { name: "Troll".into() }
    );
    assert_eq!(
        game.handle_text(10, "500").unwrap(),
        Outcome::InvalidSuggestionPoints { name: "Troll".into() }
    );
    let id = match game.handle_text(10, "3").unwrap() {
        Outcome::SuggestionSubmitted { suggestion, points, notify, .. } => {
            assert_eq!(points, 3);
            assert_eq!(notify, MODERATOR);
            suggestion
        }
        other => panic!("unexpected {other:?}"),
    };

    assert_eq!(game.begin_review(10, id, ReviewDecision::Approve).unwrap(), Outcome::Forbidden);
    assert_eq!(
        game.begin_review(MODERATOR, id, ReviewDecision::Approve).unwrap(),
        Outcome::AwaitingReviewNotes { suggestion: id, decision: ReviewDecision::Approve }
    );
    match game.handle_text(MODERATOR, "ok").unwrap() {
        Outcome::SuggestionReviewed { suggestion, decision } => {
            assert_eq!(decision, ReviewDecision::Approve);
            assert_eq!(suggestion.suggestion.status, SuggestionStatus::Approved);
            assert_eq!(suggestion.suggestion.admin_notes.as_deref(), Some("ok"));
            assert_eq!(suggestion.submitter.chat_id, 10);
        }
        other => panic!("unexpected {other:?}"),
    }

    let categories = game.ledger().categories().unwrap();
    assert!(categories.iter().any(|c| c.name == "Troll" && c.points == 3));
    assert_eq!(game.reject_now(MODERATOR, id).unwrap(), Outcome::SuggestionNotPending { suggestion: id });
}

#[test]
fn silent_rejection_and_dot_means_no_notes() {
    let game = game();
    join(&game, 10, "ada");
    game.begin_suggestion_upload(10).unwrap();
    let ids = match game.submit_document(10, "Volpe,2\nbroken\nLupo,3\n").unwrap() {
        Outcome::SuggestionsSubmitted { suggestions, .. } => suggestions,
        other => panic!("unexpected {other:?}"),
    };
    assert_eq!(ids.len(), 2);

    assert!(matches!(game.reject_now(MODERATOR, ids[0]).unwrap(), Outcome::SuggestionReviewed { .. }));
    game.begin_review(MODERATOR, ids[1], ReviewDecision::Reject).unwrap();
    match game.handle_text(MODERATOR, ".").unwrap() {
        Outcome::SuggestionReviewed { suggestion, .. } => {
            assert_eq!(suggestion.suggestion.status, SuggestionStatus::Rejected);
            assert_eq!(suggestion.suggestion.admin_notes, None);
        }
        other => panic!("unexpected {other:?}"),
    }

    assert!(game.ledger().categories().unwrap().is_empty());
    match game.my_suggestions(10).unwrap() {
        Outcome::MySuggestions { suggestions } => assert_eq!(suggestions.len(), 2),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn bulk_upload_takes_precedence_for_moderator() {
    let game = game();
    join(&game, MODERATOR, "boss");

    game.begin_suggestion_upload(MODERATOR).unwrap();
    assert_eq!(game.begin_bulk_upload(MODERATOR).unwrap(), Outcome::AwaitingUpload);
    assert_eq!(
        game.submit_document(MODERATOR, "Gufo,5\nSpada,-10\nGufo,7\n").unwrap(),
        Outcome::CategoriesLoaded { count: 2 }
    );
    assert_eq!(game.ledger().categories().unwrap().len(), 2);

    // Player lane upload is still pending
    assert_eq!(game.states().active(Lane::Player, MODERATOR), Some(FlowKind::SuggestionUpload));
    assert_eq!(game.submit_document(MODERATOR, "nothing useful").unwrap(), Outcome::NothingParsed);
    assert_eq!(game.submit_document(MODERATOR, "Lupo,3").unwrap(), Outcome::Ignored);
}

#[test]
fn moderator_actions_are_guarded() {
    let game = game();
    join(&game, 10, "ada");

    assert_eq!(game.begin_point_edit(10, 10).unwrap(), Outcome::Forbidden);
    assert_eq!(game.manage_participant(10, 10).unwrap(), Outcome::Forbidden);
    assert_eq!(game.delete_sighting(10, 1).unwrap(), Outcome::Forbidden);
    assert_eq!(game.add_category(10, "Gufo", 5).unwrap(), Outcome::Forbidden);
    assert_eq!(game.remove_category(10, 1).unwrap(), Outcome::Forbidden);
    assert_eq!(game.begin_bulk_upload(10).unwrap(), Outcome::Forbidden);
    assert_eq!(game.pending_suggestions(10).unwrap(), Outcome::Forbidden);
    assert_eq!(game.approve_now(10, 1).unwrap(), Outcome::Forbidden);
    assert!(game.ledger().categories().unwrap().is_empty());
}

#[test]
fn point_edit_overrides_total() {
    let game = game();
    join(&game, 10, "ada");

    assert_eq!(game.begin_point_edit(MODERATOR, 10).unwrap(), Outcome::AwaitingPoints { participant: 10 });
    assert_eq!(game.handle_text(MODERATOR, "lots").unwrap(), Outcome::InvalidPoints { participant: 10 });
    assert!(!game.states().has(FlowKind::PointEdit, MODERATOR));

    game.begin_point_edit(MODERATOR, 10).unwrap();
    assert_eq!(
        game.handle_text(MODERATOR, "-7").unwrap(),
        Outcome::PointsSet { participant: 10, total_points: -7 }
    );
    assert_eq!(total(&game, 10), -7);
}

#[test]
fn category_removal_reverses_points() {
    let game = game();
    join(&game, 10, "ada");
    let Outcome::CategoryAdded { category } = game.add_category(MODERATOR, "Gufo", 5).unwrap() else {
        panic!("category not added");
    };
    for n in 0..3 {
        game.choose_category(10, category.id).unwrap();
        game.submit_media(10, Media::photo(format!("f{n}"))).unwrap();
    }
    assert_eq!(total(&game, 10), 15);

    assert_eq!(
        game.remove_category(MODERATOR, category.id).unwrap(),
        Outcome::CategoryRemoved { category: category.id }
    );
    assert_eq!(total(&game, 10), 0);
    assert_eq!(
        game.remove_category(MODERATOR, category.id).unwrap(),
        Outcome::UnknownCategory { category: category.id }
    );
}

#[test]
fn galleries_consume_their_flow() {
    let game = game();
    join(&game, 10, "ada");
    let Outcome::CategoryAdded { category } = game.add_category(MODERATOR, "Gufo", 5).unwrap() else {
        panic!("category not added");
    };
    game.choose_category(10, category.id).unwrap();
    game.submit_media(10, Media::photo("f")).unwrap();

    assert_eq!(game.select_gallery_participant(10, 10).unwrap(), Outcome::AwaitingGalleryMode);
    match game.show_participant_gallery(10).unwrap() {
        Outcome::ParticipantGallery { tallies, .. } => {
            assert_eq!(tallies.len(), 1);
            assert_eq!(tallies[0].points, 5);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(game.show_participant_gallery(10).unwrap(), Outcome::Expired);

    game.select_gallery_category(10, category.id).unwrap();
    match game.show_category_gallery(10).unwrap() {
        Outcome::CategoryGallery { sightings, .. } => assert_eq!(sightings.len(), 1),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn leaderboard_ties_share_rank() {
    let game = game();
    for (chat, handle) in [(10, "ada"), (11, "bob"), (12, "cy")] {
        join(&game, chat, handle);
    }
    game.ledger().set_points_absolute(10, 5).unwrap();
    game.ledger().set_points_absolute(11, 5).unwrap();

    match game.leaderboard(None).unwrap() {
        Outcome::Leaderboard { entries } => {
            let order: Vec<_> = entries.iter().map(|e| e.participant.chat_id).collect();
            assert_eq!(order, vec![10, 11, 12]);
        }
        other => panic!("unexpected {other:?}"),
    }
    for (chat, rank) in [(10, 1), (11, 1), (12, 3)] {
        match game.standing(chat).unwrap() {
            Outcome::Standing { standing } => assert_eq!(standing.rank, rank),
            other => panic!("unexpected {other:?}"),
        }
    }

    game.unregister(12).unwrap();
    assert_eq!(game.standing(12).unwrap(), Outcome::NotRegistered);
}

#[test]
fn concurrent_media_records_once() {
    const RACERS: usize = 6;
    let game = game();
    join(&game, 10, "ada");
    let Outcome::CategoryAdded { category } = game.add_category(MODERATOR, "Gufo", 5).unwrap() else {
        panic!("category not added");
    };
    game.choose_category(10, category.id).unwrap();

    let barrier = Arc::new(Barrier::new(RACERS));
    let handles: Vec<_> = (0..RACERS)
        .map(|n| {
            let game = game.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                game.submit_media(10, Media::photo(format!("dup{n}"))).unwrap()
            })
        })
        .collect();
    let recorded = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|o| matches!(o, Outcome::SightingRecorded { .. }))
        .count();

    assert_eq!(recorded, 1);
    assert_eq!(total(&game, 10), 5);
}

#[test]
fn concurrent_sightings_keep_totals() {
    let game = game();
    for chat in 10..14 {
        join(&game, chat, &format!("p{chat}"));
    }
    let Outcome::CategoryAdded { category } = game.add_category(MODERATOR, "Gufo", 5).unwrap() else {
        panic!("category not added");
    };

    let barrier = Arc::new(Barrier::new(4));
    let handles: Vec<_> = (10..14)
        .map(|chat| {
            let game = game.clone();
            let barrier = barrier.clone();
            let id = category.id;
            thread::spawn(move || {
                barrier.wait();
                for n in 0..10 {
                    game.choose_category(chat, id).unwrap();
                    game.submit_media(chat, Media::photo(format!("{chat}-{n}"))).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for chat in 10..14 {
        assert_eq!(total(&game, chat), 50);
    }
    game.shutdown();
    assert!(game.states().is_empty());
}
