use sea_orm_migration::prelude::extension::postgres::Type;
use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Profiles {
    Table,
    Id,
    FullName,
    Email,
    Role,
    CreatedAt,
}

#[derive(DeriveIden)]
enum FeePackages {
    Table,
    Id,
    Name,
    Description,
    DurationDays,
    Price,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Members {
    Table,
    Id,
    UserId,
    MembershipNumber,
    Status,
    JoinDate,
    MembershipStartDate,
    MembershipEndDate,
    CurrentPackageId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Bills {
    Table,
    Id,
    MemberId,
    PackageId,
    Amount,
    Currency,
    Status,
    DueDate,
    PaidDate,
    GeneratedDate,
    PaymentMethod,
    Notes,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

async fn create_enum(manager: &SchemaManager<'_>, name: &str, values: &[&str]) -> Result<(), DbErr> {
    manager
        .create_type(
            Type::create()
                .as_enum(Alias::new(name))
                .values(values.iter().map(|v| Alias::new(*v)))
                .to_owned(),
        )
        .await
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // enums
        create_enum(manager, "user_role", &["admin", "member"]).await?;
        create_enum(
            manager,
            "member_status",
            &["active", "inactive", "expired", "suspended"],
        )
        .await?;
        create_enum(manager, "bill_status", &["pending", "paid", "overdue"]).await?;

        manager
            .create_table(
                Table::create()
                    .table(Profiles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Profiles::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Profiles::FullName).string_len(255).null())
                    .col(ColumnDef::new(Profiles::Email).string_len(255).null())
                    .col(
                        ColumnDef::new(Profiles::Role)
                            .custom(Alias::new("user_role"))
                            .not_null()
                            .default(Expr::cust("'member'::user_role")),
                    )
                    .col(
                        ColumnDef::new(Profiles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FeePackages::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(FeePackages::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(FeePackages::Name).string_len(255).not_null())
                    .col(ColumnDef::new(FeePackages::Description).text().null())
                    .col(ColumnDef::new(FeePackages::DurationDays).integer().not_null())
                    .col(ColumnDef::new(FeePackages::Price).big_integer().not_null())
                    .col(
                        ColumnDef::new(FeePackages::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(FeePackages::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(FeePackages::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Members::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Members::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Members::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(Members::MembershipNumber)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Members::Status)
                            .custom(Alias::new("member_status"))
                            .not_null()
                            .default(Expr::cust("'inactive'::member_status")),
                    )
                    .col(ColumnDef::new(Members::JoinDate).date().not_null())
                    .col(ColumnDef::new(Members::MembershipStartDate).date().null())
                    .col(ColumnDef::new(Members::MembershipEndDate).date().null())
                    .col(ColumnDef::new(Members::CurrentPackageId).uuid().null())
                    .col(
                        ColumnDef::new(Members::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(Members::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_members_user")
                            .from(Members::Table, Members::UserId)
                            .to(Profiles::Table, Profiles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_members_package")
                            .from(Members::Table, Members::CurrentPackageId)
                            .to(FeePackages::Table, FeePackages::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Bills::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Bills::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Bills::MemberId).uuid().not_null())
                    .col(ColumnDef::new(Bills::PackageId).uuid().null())
                    .col(ColumnDef::new(Bills::Amount).big_integer().not_null())
                    .col(
                        ColumnDef::new(Bills::Currency)
                            .string_len(3)
                            .not_null()
                            .default("USD"),
                    )
                    .col(
                        ColumnDef::new(Bills::Status)
                            .custom(Alias::new("bill_status"))
                            .not_null()
                            .default(Expr::cust("'pending'::bill_status")),
                    )
                    .col(ColumnDef::new(Bills::DueDate).date().not_null())
                    .col(ColumnDef::new(Bills::PaidDate).date().null())
                    .col(
                        ColumnDef::new(Bills::GeneratedDate)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(ColumnDef::new(Bills::PaymentMethod).string_len(64).null())
                    .col(ColumnDef::new(Bills::Notes).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bills_member")
                            .from(Bills::Table, Bills::MemberId)
                            .to(Members::Table, Members::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bills_package")
                            .from(Bills::Table, Bills::PackageId)
                            .to(FeePackages::Table, FeePackages::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_bills_status_due")
                    .table(Bills::Table)
                    .col(Bills::Status)
                    .col(Bills::DueDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_members_status_end")
                    .table(Members::Table)
                    .col(Members::Status)
                    .col(Members::MembershipEndDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(Bills::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Members::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(FeePackages::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Profiles::Table).to_owned())
            .await?;
        for name in ["bill_status", "member_status", "user_role"] {
            manager
                .drop_type(Type::drop().name(Alias::new(name)).to_owned())
                .await?;
        }
        Ok(())
    }
}
