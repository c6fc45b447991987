use std::sync::Arc;

use chavesmart::{
    common::{db_utils::pool_options, error::AppError},
    config::{AppState, Config},
    models::{
        auth::RegisterUserPayload,
        cash::{CashDirection, CashMovementPayload, OpenCashSessionPayload},
        crm::{CustomerPayload, PersonKind},
        installments::InstallmentSaleStatus,
        inventory::{ItemKind, ProductPayload, ServicePayload},
        losses::RecordLossPayload,
        sales::{CartItemInput, DiscountInput, FinalizeSalePayload, InstallmentPlanInput, PaymentMethod, SaleStatus},
        service_orders::{CreateServiceOrderPayload, FinalizeServiceOrderInput, ServiceOrderStatus},
        store::CreateEmployeePayload,
    },
    services::storage::{FileStorage, LocalFileStorage},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

// Fluxos de ponta a ponta contra um Postgres real.
// Sem TEST_DATABASE_URL/DATABASE_URL os testes só retornam.

struct Ctx {
    state: AppState,
    store_id: Uuid,
    owner_id: Uuid,
    _uploads: tempfile::TempDir,
}

fn dec(s: &str) -> Decimal {
    s.parse().expect("decimal")
}

fn database_url() -> Option<String> {
    match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
        Ok(url) => Some(url),
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests.");
            None
        }
    }
}

async fn setup(database_url: &str) -> anyhow::Result<Ctx> {
    let pool = pool_options(5).connect(database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let uploads = tempfile::tempdir()?;
    let config = Config {
        database_url: database_url.to_string(),
        jwt_secret: "segredo-de-teste".into(),
        bind_addr: "127.0.0.1:0".into(),
        db_max_connections: 5,
        upload_dir: uploads.path().to_path_buf(),
        public_files_url: "/files".into(),
        fonts_dir: "./fonts".into(),
    };
    let storage: Arc<dyn FileStorage> = Arc::new(LocalFileStorage::new(uploads.path(), "/files").await?);
    let state = AppState::build(pool, &config, storage);

    let response = state
        .auth_service
        .register_owner(&RegisterUserPayload {
            email: format!("dono-{}@teste.com", Uuid::new_v4()),
            password: "senha123".into(),
            name: "Dono".into(),
            store_name: "Chaveiro Teste".into(),
            store_tax_id: None,
        })
        .await?;
    let owner = state.auth_service.validate_token(&response.token).await?;
    let store_id = response.store_id.expect("loja criada no cadastro");

    Ok(Ctx { state, store_id, owner_id: owner.id, _uploads: uploads })
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("data")
}

async fn customer(ctx: &Ctx) -> anyhow::Result<Uuid> {
    let customer = ctx
        .state
        .crm_service
        .create_customer(
            &ctx.state.db_pool,
            ctx.store_id,
            &CustomerPayload {
                name: "Maria Cliente".into(),
                email: None,
                phone: Some("11999990000".into()),
                person_kind: PersonKind::Fisica,
                tax_id: None,
                zip_code: None,
                street: None,
                number: None,
                complement: None,
                district: None,
                city: None,
                state: None,
                notes: None,
            },
        )
        .await?;
    Ok(customer.id)
}

async fn product_with_stock(ctx: &Ctx, price: &str, stock: i32) -> anyhow::Result<Uuid> {
    let product = ctx
        .state
        .inventory_service
        .create_product(
            &ctx.state.db_pool,
            ctx.store_id,
            &ProductPayload {
                name: "Chave Yale".into(),
                code: None,
                category: None,
                price: dec(price),
                cost: dec("4.00"),
                initial_stock: stock,
            },
        )
        .await?;
    Ok(product.product.id)
}

async fn open_cash(ctx: &Ctx, amount: &str) -> anyhow::Result<Uuid> {
    let session = ctx
        .state
        .cash_service
        .open_session(
            &ctx.state.db_pool,
            ctx.store_id,
            ctx.owner_id,
            &OpenCashSessionPayload { opening_amount: dec(amount) },
        )
        .await?;
    Ok(session.id)
}

fn cart_of(product_id: Uuid, quantity: i32) -> FinalizeSalePayload {
    FinalizeSalePayload {
        items: vec![CartItemInput {
            kind: ItemKind::Produto,
            product_id: Some(product_id),
            service_id: None,
            quantity,
            unit_price: None,
        }],
        discount: Some(DiscountInput::Amount(dec("5.00"))),
        payment_method: PaymentMethod::Cash,
        customer_id: None,
        installments: None,
    }
}

#[tokio::test]
async fn cash_sale_decrements_stock_and_records_one_movement() -> anyhow::Result<()> {
    let Some(url) = database_url() else { return Ok(()) };
    let ctx = setup(&url).await?;

    let product_id = product_with_stock(&ctx, "10.00", 10).await?;
    let session_id = open_cash(&ctx, "100.00").await?;

    // 5 x 10,00 - 5,00 de desconto = 45,00
    let receipt = ctx
        .state
        .sale_service
        .finalize_sale(&ctx.state.db_pool, ctx.store_id, ctx.owner_id, &cart_of(product_id, 5))
        .await?;
    assert_eq!(receipt.sale.total, dec("45.00"));
    assert!(receipt.cash_movement_id.is_some());

    let product = ctx.state.inventory_service.get_product(&ctx.state.db_pool, ctx.store_id, product_id).await?;
    assert_eq!(product.product.stock, 5);

    let detail = ctx.state.cash_service.get_session(&ctx.state.db_pool, ctx.store_id, session_id).await?;
    assert_eq!(detail.movements.len(), 1);
    assert_eq!(detail.movements[0].amount, dec("45.00"));
    assert_eq!(detail.movements[0].category, PaymentMethod::Cash.cash_category());
    assert_eq!(detail.summary.balance, dec("145.00"));
    Ok(())
}

#[tokio::test]
async fn deleting_a_sale_restores_stock_and_removes_movement() -> anyhow::Result<()> {
    let Some(url) = database_url() else { return Ok(()) };
    let ctx = setup(&url).await?;

    let product_id = product_with_stock(&ctx, "10.00", 3).await?;
    let session_id = open_cash(&ctx, "0").await?;

    let receipt = ctx
        .state
        .sale_service
        .finalize_sale(&ctx.state.db_pool, ctx.store_id, ctx.owner_id, &cart_of(product_id, 5))
        .await?;

    // Estoque pode ficar negativo
    let product = ctx.state.inventory_service.get_product(&ctx.state.db_pool, ctx.store_id, product_id).await?;
    assert_eq!(product.product.stock, -2);

    ctx.state.sale_service.delete_sale(&ctx.state.db_pool, ctx.store_id, receipt.sale.id).await?;

    let product = ctx.state.inventory_service.get_product(&ctx.state.db_pool, ctx.store_id, product_id).await?;
    assert_eq!(product.product.stock, 3);

    let detail = ctx.state.cash_service.get_session(&ctx.state.db_pool, ctx.store_id, session_id).await?;
    assert!(detail.movements.is_empty());

    let missing = ctx.state.sale_service.get_sale(&ctx.state.db_pool, ctx.store_id, receipt.sale.id).await;
    assert!(matches!(missing, Err(AppError::ResourceNotFound(_))));
    Ok(())
}

#[tokio::test]
async fn sale_without_open_cash_session_concludes_without_movement() -> anyhow::Result<()> {
    let Some(url) = database_url() else { return Ok(()) };
    let ctx = setup(&url).await?;

    let product_id = product_with_stock(&ctx, "10.00", 10).await?;

    let receipt = ctx
        .state
        .sale_service
        .finalize_sale(&ctx.state.db_pool, ctx.store_id, ctx.owner_id, &cart_of(product_id, 2))
        .await?;
    assert_eq!(receipt.sale.status, SaleStatus::Concluida);
    assert_eq!(receipt.sale.total, dec("15.00"));
    assert!(receipt.cash_movement_id.is_none());

    let product = ctx.state.inventory_service.get_product(&ctx.state.db_pool, ctx.store_id, product_id).await?;
    assert_eq!(product.product.stock, 8);

    let sessions = ctx.state.cash_service.list_sessions(&ctx.state.db_pool, ctx.store_id).await?;
    assert!(sessions.is_empty());
    let movements: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cash_movements WHERE sale_id = $1")
        .bind(receipt.sale.id)
        .fetch_one(&ctx.state.db_pool)
        .await?;
    assert_eq!(movements, 0);
    Ok(())
}

#[tokio::test]
async fn discount_above_subtotal_records_cash_out() -> anyhow::Result<()> {
    let Some(url) = database_url() else { return Ok(()) };
    let ctx = setup(&url).await?;

    let product_id = product_with_stock(&ctx, "10.00", 10).await?;
    let session_id = open_cash(&ctx, "100.00").await?;

    let mut cart = cart_of(product_id, 1);
    cart.discount = Some(DiscountInput::Amount(dec("15.00")));
    let receipt = ctx
        .state
        .sale_service
        .finalize_sale(&ctx.state.db_pool, ctx.store_id, ctx.owner_id, &cart)
        .await?;
    assert_eq!(receipt.sale.total, dec("-5.00"));

    let detail = ctx.state.cash_service.get_session(&ctx.state.db_pool, ctx.store_id, session_id).await?;
    assert_eq!(detail.movements.len(), 1);
    assert_eq!(detail.movements[0].direction, CashDirection::Saida);
    assert_eq!(detail.movements[0].amount, dec("5.00"));
    assert_eq!(detail.summary.balance, dec("95.00"));
    Ok(())
}

#[tokio::test]
async fn installment_sale_settles_and_deletes_cleanly() -> anyhow::Result<()> {
    let Some(url) = database_url() else { return Ok(()) };
    let ctx = setup(&url).await?;

    let product_id = product_with_stock(&ctx, "99.99", 10).await?;
    let session_id = open_cash(&ctx, "0").await?;
    let customer_id = customer(&ctx).await?;

    let cart = FinalizeSalePayload {
        items: vec![CartItemInput {
            kind: ItemKind::Produto,
            product_id: Some(product_id),
            service_id: None,
            quantity: 1,
            unit_price: None,
        }],
        discount: None,
        payment_method: PaymentMethod::Other,
        customer_id: Some(customer_id),
        installments: Some(InstallmentPlanInput { count: 3, first_due_date: ymd(2099, 1, 31) }),
    };
    let receipt = ctx
        .state
        .sale_service
        .finalize_sale(&ctx.state.db_pool, ctx.store_id, ctx.owner_id, &cart)
        .await?;
    assert_eq!(receipt.sale.status, SaleStatus::Pendente);
    assert!(receipt.cash_movement_id.is_none());
    let installment_sale_id = receipt.installment_sale_id.expect("venda a prazo criada");

    let detail = ctx.state.cash_service.get_session(&ctx.state.db_pool, ctx.store_id, session_id).await?;
    assert!(detail.movements.is_empty());

    let plan = ctx.state.installment_service.get(&ctx.state.db_pool, ctx.store_id, installment_sale_id).await?;
    assert_eq!(plan.customer_name.as_deref(), Some("Maria Cliente"));
    let due: Vec<_> = plan.installments.iter().map(|i| (i.amount, i.due_date)).collect();
    assert_eq!(
        due,
        vec![
            (dec("33.33"), ymd(2099, 1, 31)),
            (dec("33.33"), ymd(2099, 3, 3)),
            (dec("33.33"), ymd(2099, 3, 31)),
        ]
    );

    let ids: Vec<Uuid> = plan.installments.iter().map(|i| i.id).collect();
    let after_first = ctx
        .state
        .installment_service
        .pay_installment(&ctx.state.db_pool, ctx.store_id, installment_sale_id, ids[0])
        .await?;
    assert_eq!(after_first.installment_sale.status, InstallmentSaleStatus::Parcial);
    assert_eq!(after_first.installment_sale.amount_paid, dec("33.33"));

    let again = ctx
        .state
        .installment_service
        .pay_installment(&ctx.state.db_pool, ctx.store_id, installment_sale_id, ids[0])
        .await;
    assert!(matches!(again, Err(AppError::InstallmentAlreadyPaid)));

    for id in &ids[1..] {
        ctx.state
            .installment_service
            .pay_installment(&ctx.state.db_pool, ctx.store_id, installment_sale_id, *id)
            .await?;
    }
    let settled = ctx.state.installment_service.get(&ctx.state.db_pool, ctx.store_id, installment_sale_id).await?;
    assert_eq!(settled.installment_sale.status, InstallmentSaleStatus::Quitada);
    let sale = ctx.state.sale_service.get_sale(&ctx.state.db_pool, ctx.store_id, receipt.sale.id).await?;
    assert_eq!(sale.sale.status, SaleStatus::Concluida);

    ctx.state.sale_service.delete_sale(&ctx.state.db_pool, ctx.store_id, receipt.sale.id).await?;

    let product = ctx.state.inventory_service.get_product(&ctx.state.db_pool, ctx.store_id, product_id).await?;
    assert_eq!(product.product.stock, 10);
    let gone = ctx.state.installment_service.get(&ctx.state.db_pool, ctx.store_id, installment_sale_id).await;
    assert!(matches!(gone, Err(AppError::ResourceNotFound(_))));
    let installments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM installments WHERE installment_sale_id = $1")
        .bind(installment_sale_id)
        .fetch_one(&ctx.state.db_pool)
        .await?;
    assert_eq!(installments, 0);
    Ok(())
}

#[tokio::test]
async fn service_line_opens_an_order_that_must_be_paid_to_finalize() -> anyhow::Result<()> {
    let Some(url) = database_url() else { return Ok(()) };
    let ctx = setup(&url).await?;

    let service = ctx
        .state
        .inventory_service
        .create_service(
            &ctx.state.db_pool,
            ctx.store_id,
            &ServicePayload {
                name: "Abertura de porta".into(),
                code: None,
                category: None,
                price: dec("30.00"),
                estimated_minutes: Some(40),
                extra_costs: Vec::new(),
            },
        )
        .await?;
    let customer_id = customer(&ctx).await?;
    open_cash(&ctx, "0").await?;

    let cart = FinalizeSalePayload {
        items: vec![CartItemInput {
            kind: ItemKind::Servico,
            product_id: None,
            service_id: Some(service.id),
            quantity: 1,
            unit_price: None,
        }],
        discount: None,
        payment_method: PaymentMethod::Pix,
        customer_id: Some(customer_id),
        installments: None,
    };
    let receipt = ctx
        .state
        .sale_service
        .finalize_sale(&ctx.state.db_pool, ctx.store_id, ctx.owner_id, &cart)
        .await?;
    assert_eq!(receipt.service_order_ids.len(), 1);
    let order_id = receipt.service_order_ids[0];

    let order = ctx.state.service_order_service.get_order(&ctx.state.db_pool, ctx.store_id, order_id).await?;
    assert_eq!(order.order.status, ServiceOrderStatus::Aberto);
    assert_eq!(order.order.sale_id, Some(receipt.sale.id));
    assert_eq!(order.order.customer_id, Some(customer_id));

    ctx.state.service_order_service.start_order(&ctx.state.db_pool, ctx.store_id, order_id).await?;

    let unpaid = FinalizeServiceOrderInput {
        responsible_id: ctx.owner_id,
        terms_accepted: true,
        paid: false,
        payment_method: None,
        occurred_perfectly: Some(true),
        problems: Vec::new(),
        proof_files: Vec::new(),
    };
    let result = ctx
        .state
        .service_order_service
        .finalize_order(&ctx.state.db_pool, ctx.store_id, ctx.owner_id, order_id, &unpaid)
        .await;
    assert!(matches!(result, Err(AppError::OrderNotPaid)));

    let order = ctx.state.service_order_service.get_order(&ctx.state.db_pool, ctx.store_id, order_id).await?;
    assert_eq!(order.order.status, ServiceOrderStatus::EmAndamento);
    assert!(order.order.completed_at.is_none());
    Ok(())
}

#[tokio::test]
async fn removing_an_order_archives_a_snapshot() -> anyhow::Result<()> {
    let Some(url) = database_url() else { return Ok(()) };
    let ctx = setup(&url).await?;

    let service = ctx
        .state
        .inventory_service
        .create_service(
            &ctx.state.db_pool,
            ctx.store_id,
            &ServicePayload {
                name: "Cópia de chave codificada".into(),
                code: None,
                category: None,
                price: dec("80.00"),
                estimated_minutes: None,
                extra_costs: Vec::new(),
            },
        )
        .await?;
    let customer_id = customer(&ctx).await?;
    let order = ctx
        .state
        .service_order_service
        .create_order(
            &ctx.state.db_pool,
            ctx.store_id,
            &CreateServiceOrderPayload {
                service_id: service.id,
                customer_id: Some(customer_id),
                expected_completion: None,
                notes: Some("Cliente volta amanhã".into()),
            },
        )
        .await?;

    let blank = ctx
        .state
        .service_order_service
        .remove_order(&ctx.state.db_pool, ctx.store_id, ctx.owner_id, order.id, "   ")
        .await;
    assert!(matches!(blank, Err(AppError::RemovalReasonRequired)));

    let removed = ctx
        .state
        .service_order_service
        .remove_order(&ctx.state.db_pool, ctx.store_id, ctx.owner_id, order.id, "Lançada em duplicidade")
        .await?;
    assert_eq!(removed.service_order_id, order.id);
    assert_eq!(removed.reason, "Lançada em duplicidade");
    assert_eq!(removed.removed_by, ctx.owner_id);
    assert_eq!(removed.snapshot["order"]["id"], order.id.to_string());
    assert_eq!(removed.snapshot["service"]["name"], "Cópia de chave codificada");
    assert_eq!(removed.snapshot["customer"]["name"], "Maria Cliente");

    let live = ctx.state.service_order_service.get_order(&ctx.state.db_pool, ctx.store_id, order.id).await;
    assert!(matches!(live, Err(AppError::ResourceNotFound(_))));
    Ok(())
}

#[tokio::test]
async fn product_loss_decrements_stock() -> anyhow::Result<()> {
    let Some(url) = database_url() else { return Ok(()) };
    let ctx = setup(&url).await?;

    let product_id = product_with_stock(&ctx, "10.00", 8).await?;

    let loss = ctx
        .state
        .loss_service
        .record_loss(
            &ctx.state.db_pool,
            ctx.store_id,
            ctx.owner_id,
            &RecordLossPayload {
                kind: ItemKind::Produto,
                product_id: Some(product_id),
                service_id: None,
                quantity: 3,
                unit_value: None,
                category_id: None,
                notes: Some("Quebrou na máquina".into()),
            },
        )
        .await?;
    // Sem valor informado: custo do produto
    assert_eq!(loss.total, dec("12.00"));

    let product = ctx.state.inventory_service.get_product(&ctx.state.db_pool, ctx.store_id, product_id).await?;
    assert_eq!(product.product.stock, 5);
    Ok(())
}

#[tokio::test]
async fn cash_session_balance_and_single_open_session() -> anyhow::Result<()> {
    let Some(url) = database_url() else { return Ok(()) };
    let ctx = setup(&url).await?;

    let session_id = open_cash(&ctx, "100.00").await?;
    ctx.state
        .cash_service
        .record_movement(
            &ctx.state.db_pool,
            ctx.store_id,
            ctx.owner_id,
            session_id,
            &CashMovementPayload {
                direction: CashDirection::Entrada,
                category: "Suprimento".into(),
                description: None,
                amount: dec("50.00"),
            },
        )
        .await?;

    let second = open_cash(&ctx, "10.00").await;
    let second_err = second.expect_err("segundo caixa aberto");
    assert!(matches!(
        second_err.downcast_ref::<AppError>(),
        Some(AppError::CashSessionAlreadyOpen)
    ));

    let closed = ctx
        .state
        .cash_service
        .close_session(&ctx.state.db_pool, ctx.store_id, ctx.owner_id, session_id)
        .await?;
    assert_eq!(closed.summary.balance, dec("150.00"));
    assert_eq!(closed.session.closing_amount, Some(dec("150.00")));

    // Caixa fechado não recebe movimento
    let late = ctx
        .state
        .cash_service
        .record_movement(
            &ctx.state.db_pool,
            ctx.store_id,
            ctx.owner_id,
            session_id,
            &CashMovementPayload {
                direction: CashDirection::Saida,
                category: "Sangria".into(),
                description: None,
                amount: dec("1.00"),
            },
        )
        .await;
    assert!(matches!(late, Err(AppError::CashSessionClosed(_))));
    Ok(())
}

#[tokio::test]
async fn duplicate_employee_email_is_rejected_and_owner_cannot_deactivate_self() -> anyhow::Result<()> {
    let Some(url) = database_url() else { return Ok(()) };
    let ctx = setup(&url).await?;

    let email = format!("func-{}@teste.com", Uuid::new_v4());
    let payload = CreateEmployeePayload {
        email: email.clone(),
        password: "senha123".into(),
        name: Some("Funcionário".into()),
        phone: None,
        access_level: None,
        job_title: Some("Chaveiro".into()),
        salary: Some(dec("2000.00")),
        admission_date: None,
    };

    let employee = ctx
        .state
        .store_service
        .create_employee(&ctx.state.db_pool, ctx.store_id, ctx.owner_id, &payload)
        .await?;
    assert!(employee.is_active);

    let again = ctx
        .state
        .store_service
        .create_employee(&ctx.state.db_pool, ctx.store_id, ctx.owner_id, &payload)
        .await;
    assert!(matches!(again, Err(AppError::EmailAlreadyExists)));

    let employees = ctx.state.store_service.list_employees(&ctx.state.db_pool, ctx.store_id).await?;
    assert_eq!(employees.iter().filter(|e| e.user_id == employee.user_id).count(), 1);

    // O dono não pode se desativar
    let owner_link = employees
        .iter()
        .find(|e| e.user_id == ctx.owner_id)
        .expect("vínculo do dono");
    let self_deactivate = ctx
        .state
        .store_service
        .deactivate_employee(&ctx.state.db_pool, ctx.store_id, ctx.owner_id, owner_link.id)
        .await;
    assert!(matches!(self_deactivate, Err(AppError::CannotModifySelf)));
    Ok(())
}

#[tokio::test]
async fn failed_employee_link_removes_the_created_login() -> anyhow::Result<()> {
    let Some(url) = database_url() else { return Ok(()) };
    let ctx = setup(&url).await?;

    let email = format!("func-{}@teste.com", Uuid::new_v4());
    let payload = CreateEmployeePayload {
        email: email.clone(),
        password: "senha123".into(),
        name: Some("Funcionário".into()),
        phone: None,
        access_level: None,
        job_title: None,
        salary: None,
        admission_date: None,
    };

    // Loja inexistente: o login é criado e o vínculo falha na FK
    let result = ctx
        .state
        .store_service
        .create_employee(&ctx.state.db_pool, Uuid::new_v4(), ctx.owner_id, &payload)
        .await;
    assert!(matches!(result, Err(AppError::DatabaseError(_))));

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = $1")
        .bind(&email)
        .fetch_one(&ctx.state.db_pool)
        .await?;
    assert_eq!(users, 0);

    let employee = ctx
        .state
        .store_service
        .create_employee(&ctx.state.db_pool, ctx.store_id, ctx.owner_id, &payload)
        .await?;
    assert!(employee.is_active);
    Ok(())
}

#[tokio::test]
async fn released_connections_drop_the_store_context() -> anyhow::Result<()> {
    let Some(url) = database_url() else { return Ok(()) };

    // Uma conexão só: a segunda aquisição recebe a mesma conexão de volta
    let pool = pool_options(1).connect(&url).await?;
    let store_id = Uuid::new_v4();

    {
        let mut conn = pool.acquire().await?;
        sqlx::query("SELECT set_config('app.store_id', $1, false)")
            .bind(store_id.to_string())
            .execute(&mut *conn)
            .await?;
        let current: Option<String> = sqlx::query_scalar("SELECT current_setting('app.store_id', true)")
            .fetch_one(&mut *conn)
            .await?;
        assert_eq!(current, Some(store_id.to_string()));
    }

    let mut conn = pool.acquire().await?;
    let current: Option<String> = sqlx::query_scalar("SELECT current_setting('app.store_id', true)")
        .fetch_one(&mut *conn)
        .await?;
    assert_eq!(current.unwrap_or_default(), "");
    Ok(())
}
