//! The form fields shared by the new transaction and edit transaction pages.

use maud::{Markup, html};
use time::Date;

use crate::{
    account::Account,
    category::Category,
    database_id::{AccountId, CategoryId},
    html::{
        FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE,
    },
};

/// Whether money left or entered the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    Expense,
    Income,
}

/// The values to prefill the transaction form with.
pub struct TransactionFormDefaults<'a> {
    pub transaction_type: TransactionType,
    /// The unsigned amount in currency units.
    pub amount: Option<f64>,
    pub date: Date,
    pub payee: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub account_id: Option<AccountId>,
    pub category_id: Option<CategoryId>,
    /// The latest date the date picker allows, normally today.
    pub max_date: Date,
}

impl TransactionFormDefaults<'_> {
    /// Defaults for a blank form: an expense dated today.
    pub fn empty(max_date: Date) -> Self {
        Self {
            transaction_type: TransactionType::Expense,
            amount: None,
            date: max_date,
            payee: None,
            notes: None,
            account_id: None,
            category_id: None,
            max_date,
        }
    }
}

pub fn transaction_form_fields(
    defaults: &TransactionFormDefaults<'_>,
    accounts: &[Account],
    categories: &[Category],
) -> Markup {
    let is_expense = matches!(defaults.transaction_type, TransactionType::Expense);
    let amount_str = defaults.amount.map(|amount| format!("{:.2}", amount.abs()));

    html! {
        fieldset class="space-y-2"
        {
            legend class=(FORM_LABEL_STYLE) { "Transaction type" }

            div class=(FORM_RADIO_GROUP_STYLE)
            {
                div class="flex items-center gap-3"
                {
                    input
                        name="type_"
                        id="transaction-type-expense"
                        type="radio"
                        value="expense"
                        checked[is_expense]
                        required
                        class=(FORM_RADIO_INPUT_STYLE);

                    label
                        for="transaction-type-expense"
                        class=(FORM_RADIO_LABEL_STYLE)
                    {
                        "Expense"
                    }
                }

                div class="flex items-center gap-3"
                {
                    input
                        name="type_"
                        id="transaction-type-income"
                        type="radio"
                        value="income"
                        checked[!is_expense]
                        required
                        class=(FORM_RADIO_INPUT_STYLE);

                    label
                        for="transaction-type-income"
                        class=(FORM_RADIO_LABEL_STYLE)
                    {
                        "Income"
                    }
                }
            }
        }

        div
        {
            label for="account_id" class=(FORM_LABEL_STYLE) { "Account" }

            select
                name="account_id"
                id="account_id"
                required
                class=(FORM_TEXT_INPUT_STYLE)
            {
                option value="" disabled selected[defaults.account_id.is_none()] { "Select an account" }

                @for account in accounts {
                    option
                        value=(account.id)
                        selected[defaults.account_id == Some(account.id)]
                    {
                        (account.name)
                    }
                }
            }
        }

        div
        {
            label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

            select
                name="category_id"
                id="category_id"
                class=(FORM_TEXT_INPUT_STYLE)
            {
                option value="" selected[defaults.category_id.is_none()] { "Uncategorised" }

                @for category in categories {
                    option
                        value=(category.id)
                        selected[defaults.category_id == Some(category.id)]
                    {
                        (category.name)
                    }
                }
            }
        }

        div
        {
            label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

            div class="input-wrapper w-full"
            {
                input
                    name="amount"
                    id="amount"
                    type="number"
                    step="0.001"
                    placeholder=(amount_str.as_deref().unwrap_or("0.00"))
                    min="0.001"
                    required
                    value=[amount_str.as_deref()]
                    autofocus[defaults.amount.is_none()]
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }

        div
        {
            label for="date" class=(FORM_LABEL_STYLE) { "Date" }

            input
                name="date"
                id="date"
                type="date"
                max=(defaults.max_date)
                value=(defaults.date)
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="payee" class=(FORM_LABEL_STYLE) { "Payee" }

            input
                name="payee"
                id="payee"
                type="text"
                placeholder="e.g. Corner Bakery"
                value=[defaults.payee]
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="notes" class=(FORM_LABEL_STYLE) { "Notes" }

            input
                name="notes"
                id="notes"
                type="text"
                placeholder="Optional notes"
                value=[defaults.notes]
                class=(FORM_TEXT_INPUT_STYLE);
        }
    }
}
