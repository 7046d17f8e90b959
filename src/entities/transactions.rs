use super::choice::choice_enum;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

choice_enum! {
    TransactionType {
        Deposit => ("deposit", "واریز"),
        Withdrawal => ("withdrawal", "برداشت"),
    }
}

choice_enum! {
    PaymentMethod {
        Gateway => ("gateway", "درگاه"),
        Card => ("card", "کارت به کارت"),
        Paya => ("paya", "پایا"),
    }
}

choice_enum! {
    VerificationStatus {
        Pending => ("pending", "در انتظار"),
        Valid => ("valid", "معتبر"),
        Invalid => ("invalid", "نامعتبر"),
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub target_user_id: i32,
    pub amount: i64,
    #[sea_orm(column_name = "type")]
    pub transaction_type: TransactionType,
    pub timestamp: DateTime<Utc>,
    pub reference_number: Option<String>,
    pub payment_method: PaymentMethod,
    pub verification_status: VerificationStatus,
    pub verification_timestamp: Option<DateTime<Utc>>,
    pub receipt_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
