//! Order admission through payment creation and the provider callback

use bytes::Bytes;
use chrono::{Duration, Utc};
use http::{Method, Request, StatusCode};
use paygate::cardpay::{
    BuilderRegistry, NOTIFY_PATH, SIGNATURE_HEADER, WebhookResponse, notification_signature,
};
use paygate::prelude::*;
use paygate::{
    FixedPackage, InMemoryRepository, InstrumentType, ManualClock, PaymentMethod,
    PaymentMethodParams, PaymentSystem, Project, ProjectPaymentMethod, StaticGeoLookup,
    external_code, requisite,
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAYER_IP: &str = "203.0.113.7";
const CALLBACK_SECRET: &str = "callback-secret";

struct Gateway {
    repository: Arc<InMemoryRepository>,
    clock: Arc<ManualClock>,
    settings: Arc<GatewaySettings>,
    project: Project,
}

async fn gateway(api_url: &str) -> Gateway {
    let system = PaymentSystem {
        id: Uuid::new_v4(),
        name: "CardPay".into(),
        is_active: true,
        api_url: api_url.to_string(),
        accounting_currency: Currency::USD,
        accounting_period: "every-day".into(),
    };
    let method = PaymentMethod {
        id: Uuid::new_v4(),
        name: "Bank card".into(),
        group_alias: "bank_card".into(),
        is_active: true,
        instrument: InstrumentType::BankCard,
        payment_system_id: system.id,
        params: PaymentMethodParams {
            handler: "cardpay".into(),
            terminal: None,
            external_id: external_code::BANK_CARD.into(),
        },
        currencies: vec![Currency::USD],
        min_payment_amount: Some(Decimal::ONE),
        max_payment_amount: Some(Decimal::new(1000, 0)),
        account_regexp: None,
    };
    let project = Project {
        id: Uuid::new_v4(),
        name: "Game".into(),
        is_active: true,
        secret_key: "project-secret".into(),
        payment_methods: HashMap::from([(
            "bank_card".to_string(),
            vec![ProjectPaymentMethod {
                id: method.id,
                enabled: true,
                added_at: Utc::now() - Duration::days(1),
            }],
        )]),
        fixed_packages: HashMap::from([(
            "US".to_string(),
            vec![FixedPackage {
                id: Uuid::new_v4(),
                name: "100 gems".into(),
                region: "US".into(),
                price: Decimal::new(1500, 2),
                currency: Currency::USD,
                is_active: true,
            }],
        )]),
        only_fixed_amounts: true,
        allow_dynamic_notify_urls: false,
        allow_dynamic_redirect_urls: false,
        min_payment_amount: None,
        max_payment_amount: None,
    };

    let repository = Arc::new(InMemoryRepository::new());
    repository.add_project(project.clone()).await;
    repository.add_payment_method(method).await;
    repository.add_payment_system(system).await;

    let settings = GatewaySettings::from_value(serde_json::json!({
        "cardpay": {
            "BANKCARD": {
                "terminal_id": "1000",
                "secret_word": "terminal-password",
                "callback_secret_word": CALLBACK_SECRET
            }
        }
    }))
    .unwrap();

    Gateway {
        repository,
        clock: Arc::new(ManualClock::default()),
        settings: Arc::new(settings),
        project,
    }
}

impl Gateway {
    fn orders(&self) -> OrderProcessor {
        let geo = StaticGeoLookup::new().with_entry(PAYER_IP.parse().unwrap(), "US");
        OrderProcessor::new(self.repository.clone(), Arc::new(geo), self.clock.clone())
            .with_settings(&self.settings)
    }

    fn endpoint(&self) -> NotificationEndpoint {
        let processor = NotificationProcessor::from_settings(
            self.repository.clone(),
            self.clock.clone(),
            &self.settings.cardpay,
        );
        NotificationEndpoint::new(Arc::new(processor))
    }

    fn card_request(&self, amount: Decimal) -> OrderRequest {
        let mut request = OrderRequest::new(self.project.id, amount, "player-42")
            .with_currency("USD")
            .with_origin_ip(PAYER_IP);
        request.payment_method = Some("bank_card".into());
        for (key, value) in [
            (requisite::PAN, "4111111111111111"),
            (requisite::CVV, "123"),
            (requisite::MONTH, "12"),
            (requisite::YEAR, "30"),
            (requisite::HOLDER, "JANE DOE"),
        ] {
            request.requisites.insert(key.to_string(), value.to_string());
        }
        request
    }
}

fn callback(order_id: Uuid, status: &str) -> Request<Bytes> {
    let raw = serde_json::to_vec(&serde_json::json!({
        "merchant_order": {"id": order_id.to_string()},
        "payment_method": "BANKCARD",
        "callback_time": "2026-03-01T12:31:05Z",
        "card_account": {"masked_pan": "411111...1111", "issuing_country_code": "US"},
        "payment_data": {"id": "cp-9001", "amount": 15.00, "currency": "USD", "status": status}
    }))
    .unwrap();

    Request::builder()
        .method(Method::POST)
        .uri(NOTIFY_PATH)
        .header(SIGNATURE_HEADER, notification_signature(&raw, CALLBACK_SECRET))
        .body(Bytes::from(raw))
        .unwrap()
}

fn message(body: &Bytes) -> String {
    serde_json::from_slice::<WebhookResponse>(body).unwrap().message
}

#[tokio::test]
async fn test_fixed_amount_order_builds_card_payload() {
    let gateway = gateway("https://sandbox.cardpay.com").await;

    let order = gateway
        .orders()
        .process(&gateway.card_request(Decimal::new(1500, 2)))
        .await
        .unwrap();
    assert_eq!(order.fixed_package.as_ref().map(|p| p.name.as_str()), Some("100 gems"));

    let payload = BuilderRegistry::default().build(&order, Utc::now()).unwrap();
    assert_eq!(payload.payment_data.amount, Decimal::new(1500, 2));
    assert_eq!(payload.payment_data.currency, "USD");
    assert_eq!(payload.merchant_order.items[0].name, "100 gems");

    let json = serde_json::to_value(&payload).unwrap();
    assert_eq!(json["card_account"]["card"]["expiration"], "12/2030");

    let card = payload.card_account.unwrap().card;
    assert_eq!(card.expiration, "12/2030");
    assert_eq!(json["payment_data"]["amount"], serde_json::json!(15.0));
}

#[tokio::test]
async fn test_amount_without_package_is_rejected() {
    let gateway = gateway("https://sandbox.cardpay.com").await;

    let result = gateway
        .orders()
        .process(&gateway.card_request(Decimal::new(1600, 2)))
        .await;
    assert_eq!(result.unwrap_err(), AdmissionError::FixedPackageNotFound);
}

#[tokio::test]
async fn test_payment_lifecycle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token_type": "bearer",
            "access_token": "access",
            "refresh_token": "refresh",
            "expires_in": 300,
            "refresh_expires_in": 1800
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/payments"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"redirect_url": "https://cardpay/3ds"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway(&server.uri()).await;
    let mut order = gateway
        .orders()
        .process(&gateway.card_request(Decimal::new(1500, 2)))
        .await
        .unwrap();

    let client = GatewayPaymentClient::new(
        gateway.settings.clone(),
        Arc::new(TokenStore::new()),
        gateway.clock.clone(),
    )
    .unwrap();
    let accepted = client.create_payment(&order).await.unwrap();
    assert_eq!(accepted.redirect_url, "https://cardpay/3ds");

    order.status = OrderStatus::PaymentSystemCreate;
    gateway.repository.update_order(&order).await.unwrap();
    let updates = gateway.repository.order_updates();

    let endpoint = gateway.endpoint();
    let response = endpoint.handle(callback(order.id, "COMPLETED")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(message(response.body()), "Payment successfully complete");

    let stored = gateway.repository.order(order.id).await.unwrap();
    assert_eq!(stored.status, OrderStatus::PaymentSystemComplete);
    assert_eq!(
        stored.payment_method_income,
        Some(Money::new(Decimal::new(1500, 2), Currency::USD))
    );
    assert_eq!(stored.payment_method_terminal_id.as_deref(), Some("1000"));
    assert_eq!(gateway.repository.order_updates(), updates + 1);

    let repeat = endpoint.handle(callback(order.id, "COMPLETED")).await;
    assert_eq!(repeat.status(), StatusCode::OK);
    assert_eq!(message(repeat.body()), "order with specified identifier payed early");
    assert_eq!(gateway.repository.order_updates(), updates + 1);

    let unknown = endpoint.handle(callback(Uuid::new_v4(), "COMPLETED")).await;
    assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_tampered_callback_leaves_order_untouched() {
    let gateway = gateway("https://sandbox.cardpay.com").await;
    let order = gateway
        .orders()
        .process(&gateway.card_request(Decimal::new(1500, 2)))
        .await
        .unwrap();

    let request = callback(order.id, "COMPLETED");
    let (parts, body) = request.into_parts();
    let mut tampered = body.to_vec();
    tampered.extend_from_slice(b"\n");

    let response = gateway
        .endpoint()
        .handle(Request::from_parts(parts, Bytes::from(tampered)))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(message(response.body()), "request signature is invalid");
    assert_eq!(
        gateway.repository.order(order.id).await.unwrap().status,
        OrderStatus::Created
    );
    assert_eq!(gateway.repository.order_updates(), 0);
}
