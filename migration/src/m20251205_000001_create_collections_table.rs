use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Collection::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Collection::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Collection::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    // JSON array of field definitions, in display order
                    .col(ColumnDef::new(Collection::Fields).text().not_null())
                    .col(
                        ColumnDef::new(Collection::CreatedAt)
                            .big_integer()
                            .not_null()
                            .default(Expr::cust("(strftime('%s', 'now'))")),
                    )
                    .col(
                        ColumnDef::new(Collection::UpdatedAt)
                            .big_integer()
                            .not_null()
                            .default(Expr::cust("(strftime('%s', 'now'))")),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Collection::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Collection {
    #[sea_orm(iden = "collections")]
    Table,
    Id,
    Name,
    Fields,
    CreatedAt,
    UpdatedAt,
}
