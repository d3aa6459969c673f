#[cfg(test)]
mod checkin_workflow_tests {
    use okrserver::goals::{CheckinStatus, ObjectiveFilter, OkrError, OkrStatus};
    use okrserver::tests::test_util::{checkin_fields, Fixture};
    use okrserver::{assert_err, assert_ok};
    use std::sync::Barrier;

    #[test]
    fn test_draft_submit_review_scenario() {
        let fx = Fixture::new();
        let okr = fx.objective(fx.owner, None);

        let c1 = fx
            .service
            .submit_checkin(&fx.as_owner(), okr.id, checkin_fields(20.0, 100.0), true)
            .unwrap();
        assert_eq!(c1.status, CheckinStatus::Draft);
        assert_eq!(c1.percent, 20);

        let c2 = fx
            .service
            .submit_checkin(&fx.as_owner(), okr.id, checkin_fields(20.0, 100.0), false)
            .unwrap();
        assert_eq!(c2.status, CheckinStatus::Waiting);
        assert_eq!(c2.percent, 20);
        let detail = fx.service.get_objective(okr.id).unwrap();
        assert_eq!(detail.change, "+20");
        assert_eq!(detail.status, OkrStatus::Waiting);

        let r1 = fx
            .service
            .create_review(&fx.as_superior(), c2.id, okr.id, fx.comments())
            .unwrap();
        assert_eq!(r1.checkin_id, c2.id);
        assert_eq!(r1.reviewer_id, fx.superior);
        assert_eq!(
            fx.service.get_checkin(c2.id).unwrap().checkin.status,
            CheckinStatus::Checked
        );
        assert_eq!(fx.service.get_review(c2.id).unwrap(), Some(r1));
        assert_eq!(fx.service.get_objective(okr.id).unwrap().status, OkrStatus::Checked);

        let err = assert_err!(fx
            .service
            .create_review(&fx.as_owner(), c2.id, okr.id, fx.comments()));
        assert!(matches!(err, OkrError::Conflict(_)));

        let c3 = assert_ok!(fx
            .service
            .submit_checkin(&fx.as_owner(), okr.id, checkin_fields(35.0, 100.0), false));
        let err = assert_err!(fx
            .service
            .create_review(&fx.as_stranger(), c3.id, okr.id, fx.comments()));
        assert!(matches!(err, OkrError::Forbidden(_)));
        let err = assert_err!(fx
            .service
            .create_review(&fx.as_owner(), c3.id, okr.id, fx.comments()));
        assert!(matches!(err, OkrError::Forbidden(_)));
        assert!(fx.service.get_review(c3.id).unwrap().is_none());
    }

    #[test]
    fn test_zero_target_checkin() {
        let fx = Fixture::new();
        let okr = fx.objective(fx.owner, None);
        let checkin = fx
            .service
            .submit_checkin(&fx.as_owner(), okr.id, checkin_fields(5.0, 0.0), false)
            .unwrap();
        assert_eq!(checkin.percent, 0);
        assert_eq!(fx.service.get_objective(okr.id).unwrap().change, "+0");
    }

    #[test]
    fn test_children_and_owner_filter_surface_ancestor() {
        let fx = Fixture::new();
        let p = fx.objective(fx.superior, None);
        let q = fx.objective(fx.owner, Some(p.id));
        let unrelated = fx.objective(fx.stranger, None);

        let children = fx.service.list_children(p.id).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].objective.id, q.id);
        assert!(!children[0].has_children);

        let all = fx.service.list_objectives(&ObjectiveFilter::default()).unwrap();
        let ids: Vec<_> = all.iter().map(|v| v.objective.id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&p.id) && ids.contains(&unrelated.id));
        assert!(all.iter().all(|v| !v.expanded));

        let filter = ObjectiveFilter {
            owner_id: Some(fx.owner),
            ..Default::default()
        };
        let surfaced = fx.service.list_objectives(&filter).unwrap();
        assert_eq!(surfaced.len(), 1);
        assert_eq!(surfaced[0].objective.id, p.id);
        assert!(surfaced[0].has_children);
        assert!(surfaced[0].expanded);
        assert_eq!(surfaced[0].children.len(), 1);
        assert_eq!(surfaced[0].children[0].objective.id, q.id);

        let ancestors = fx.service.list_ancestors(q.id).unwrap();
        assert_eq!(ancestors.len(), 1);
        assert_eq!(ancestors[0].id, p.id);
    }

    #[test]
    fn test_racing_reviews_yield_one_success_and_one_conflict() {
        let fx = Fixture::new();
        let okr = fx.objective(fx.owner, None);
        let waiting = fx
            .service
            .submit_checkin(&fx.as_owner(), okr.id, checkin_fields(50.0, 100.0), false)
            .unwrap();

        let barrier = Barrier::new(2);
        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    let barrier = &barrier;
                    let fx = &fx;
                    let (checkin_id, okr_id) = (waiting.id, okr.id);
                    scope.spawn(move || {
                        barrier.wait();
                        fx.service
                            .create_review(&fx.as_superior(), checkin_id, okr_id, fx.comments())
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(OkrError::Conflict(_))))
                .count(),
            1
        );
    }

    #[test]
    fn test_racing_submissions_leave_one_waiting() {
        let fx = Fixture::new();
        let okr = fx.objective(fx.owner, None);

        let barrier = Barrier::new(2);
        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = [10.0, 20.0]
                .into_iter()
                .map(|achieved| {
                    let barrier = &barrier;
                    let fx = &fx;
                    let okr_id = okr.id;
                    scope.spawn(move || {
                        barrier.wait();
                        fx.service.submit_checkin(
                            &fx.as_owner(),
                            okr_id,
                            checkin_fields(achieved, 100.0),
                            false,
                        )
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(OkrError::Conflict(_)))));
        let waiting = fx
            .service
            .list_checkin_history(okr.id)
            .unwrap()
            .into_iter()
            .filter(|c| c.status == CheckinStatus::Waiting)
            .count();
        assert_eq!(waiting, 1);
    }
}
