//! Test helpers.

use std::sync::Arc;

use salvo::{affix_state::inject, prelude::*};
use souq_app::{
    auth::{MockAuthService, Principal},
    context::AppContext,
    domain::{
        carts::{MockActiveCartsService, MockDraftCartsService},
        offers::MockOffersService,
        orders::MockOrdersService,
        products::MockProductsService,
        reconciliation::MockReconciliationService,
        users::{
            MockUsersService,
            records::{Role, UserUuid},
        },
    },
};
use uuid::Uuid;

use crate::{extensions::*, state::State};

pub(crate) const CONSUMER: Principal =
    Principal::new(UserUuid::from_uuid(Uuid::from_u128(1)), Role::Consumer);

pub(crate) const STAFF: Principal =
    Principal::new(UserUuid::from_uuid(Uuid::from_u128(2)), Role::Staff);

#[salvo::handler]
pub(crate) async fn inject_consumer(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_principal(CONSUMER);
    ctrl.call_next(req, depot, res).await;
}

#[salvo::handler]
pub(crate) async fn inject_staff(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_principal(STAFF);
    ctrl.call_next(req, depot, res).await;
}

fn strict_auth_mock() -> MockAuthService {
    let mut auth = MockAuthService::new();

    auth.expect_authenticate_bearer().never();

    auth
}

fn strict_products_mock() -> MockProductsService {
    let mut products = MockProductsService::new();

    products.expect_list_products().never();
    products.expect_get_product().never();
    products.expect_create_product().never();
    products.expect_update_product().never();
    products.expect_delete_product().never();

    products
}

fn strict_offers_mock() -> MockOffersService {
    let mut offers = MockOffersService::new();

    offers.expect_list_offers().never();
    offers.expect_get_offer().never();
    offers.expect_create_offer().never();
    offers.expect_change_offer_product().never();
    offers.expect_update_offer().never();
    offers.expect_delete_offer().never();

    offers
}

fn strict_active_carts_mock() -> MockActiveCartsService {
    let mut carts = MockActiveCartsService::new();

    carts.expect_get_cart().never();
    carts.expect_add_product().never();
    carts.expect_add_multi_product().never();
    carts.expect_remove_product().never();
    carts.expect_clear_cart().never();

    carts
}

fn strict_draft_carts_mock() -> MockDraftCartsService {
    let mut drafts = MockDraftCartsService::new();

    drafts.expect_get_cart().never();
    drafts.expect_add_product().never();
    drafts.expect_add_multi_product().never();
    drafts.expect_remove_product().never();
    drafts.expect_confirm_product().never();

    drafts
}

fn strict_orders_mock() -> MockOrdersService {
    let mut orders = MockOrdersService::new();

    orders.expect_place_order().never();
    orders.expect_get_order().never();
    orders.expect_list_orders().never();
    orders.expect_change_order_status().never();
    orders.expect_order_again().never();

    orders
}

fn strict_reconciliation_mock() -> MockReconciliationService {
    let mut reconciliation = MockReconciliationService::new();

    reconciliation.expect_move_product_to_draft().never();
    reconciliation.expect_enqueue().never();
    reconciliation.expect_get_job().never();
    reconciliation.expect_queue_stats().never();

    reconciliation
}

fn strict_users_mock() -> MockUsersService {
    let mut users = MockUsersService::new();

    users.expect_create_user().never();
    users.expect_get_user().never();

    users
}

fn strict_context() -> AppContext {
    AppContext {
        products: Arc::new(strict_products_mock()),
        offers: Arc::new(strict_offers_mock()),
        active_carts: Arc::new(strict_active_carts_mock()),
        draft_carts: Arc::new(strict_draft_carts_mock()),
        orders: Arc::new(strict_orders_mock()),
        reconciliation: Arc::new(strict_reconciliation_mock()),
        users: Arc::new(strict_users_mock()),
        auth: Arc::new(strict_auth_mock()),
    }
}

pub(crate) fn state_with_auth(auth: MockAuthService) -> Arc<State> {
    State::from_app_context(AppContext {
        auth: Arc::new(auth),
        ..strict_context()
    })
}

pub(crate) fn state_with_products(products: MockProductsService) -> Arc<State> {
    State::from_app_context(AppContext {
        products: Arc::new(products),
        ..strict_context()
    })
}

pub(crate) fn state_with_offers(offers: MockOffersService) -> Arc<State> {
    State::from_app_context(AppContext {
        offers: Arc::new(offers),
        ..strict_context()
    })
}

pub(crate) fn state_with_active_carts(carts: MockActiveCartsService) -> Arc<State> {
    State::from_app_context(AppContext {
        active_carts: Arc::new(carts),
        ..strict_context()
    })
}

pub(crate) fn state_with_draft_carts(drafts: MockDraftCartsService) -> Arc<State> {
    State::from_app_context(AppContext {
        draft_carts: Arc::new(drafts),
        ..strict_context()
    })
}

pub(crate) fn state_with_orders(orders: MockOrdersService) -> Arc<State> {
    State::from_app_context(AppContext {
        orders: Arc::new(orders),
        ..strict_context()
    })
}

pub(crate) fn state_with_reconciliation(
    reconciliation: MockReconciliationService,
) -> Arc<State> {
    State::from_app_context(AppContext {
        reconciliation: Arc::new(reconciliation),
        ..strict_context()
    })
}

/// Serve `route` as an authenticated consumer.
pub(crate) fn consumer_service(state: Arc<State>, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(state))
            .hoop(inject_consumer)
            .push(route),
    )
}

/// Serve `route` as an authenticated staff member.
pub(crate) fn staff_service(state: Arc<State>, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(state))
            .hoop(inject_staff)
            .push(route),
    )
}
