use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::{
    api::models::{AddMemberRequest, BalancesResponse, CreateGroupRequest, ErrorResponse, SettleRequest},
    core::{
        models::{
            expense::{
                Category, ExpenseSuggestions, ExpenseView, NewPersonalExpense, PaymentType, PersonalExpense,
            },
            group::{Group, GroupExpense, GroupMember, SplitType},
            settlement::SettlementRecord,
        },
        services::{GroupSummary, NewGroupExpense, NewGroupMember, SettleResponse},
    },
};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "Bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::create_group,
        super::handlers::list_groups,
        super::handlers::get_group,
        super::handlers::add_member,
        super::handlers::claim_membership,
        super::handlers::add_group_expense,
        super::handlers::remove_group_expense,
        super::handlers::settle,
        super::handlers::get_balances,
        super::handlers::get_summary,
        super::handlers::create_expense,
        super::handlers::list_expenses,
        super::handlers::delete_expense
    ),
    components(schemas(
        CreateGroupRequest,
        AddMemberRequest,
        SettleRequest,
        BalancesResponse,
        ErrorResponse,
        NewGroupMember,
        NewGroupExpense,
        NewPersonalExpense,
        Group,
        GroupMember,
        GroupExpense,
        SplitType,
        SettlementRecord,
        PersonalExpense,
        ExpenseView,
        ExpenseSuggestions,
        Category,
        PaymentType,
        GroupSummary,
        SettleResponse
    )),
    modifiers(&BearerAuth),
    info(
        title = "Split Ledger API",
        description = "API for shared group ledgers, balance simplification and settlements",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;
