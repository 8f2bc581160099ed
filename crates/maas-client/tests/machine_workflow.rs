//! End-to-end builder workflows against a mocked MAAS region controller.

use maas_client::{ClientSet, DeployMode, DnsResourceListParams, Error, MachineStatus, SystemId};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API: &str = "/MAAS/api/2.0";

fn client(server: &MockServer) -> ClientSet {
    ClientSet::new_authenticated(format!("{}/MAAS", server.uri()), "ck:tk:ts").unwrap()
}

fn machine(status: &str) -> Value {
    json!({
        "system_id": "e37xxm",
        "hostname": "node-1",
        "fqdn": "node-1.maas",
        "status_name": status,
        "power_state": "on",
        "zone": {"id": 2, "name": "az1", "description": ""},
        "ip_addresses": ["10.0.0.5"],
        "osystem": "custom",
        "distro_series": "u-1804-0-k-11915-0",
        "swap_size": 0,
        "ephemeral_deploy": true
    })
}

#[tokio::test]
async fn allocate_with_unknown_system_id_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{API}/machines/")))
        .and(query_param("op", "allocate"))
        .and(body_string_contains("system_id=abc"))
        .respond_with(
            ResponseTemplate::new(409).set_body_string(
                "No available machine matches constraints: [('system_id', ['abc'])]",
            ),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server)
        .machines()
        .allocator()
        .with_system_id(SystemId::parse_str("abc").unwrap())
        .allocate()
        .await;

    assert!(matches!(result, Err(Error::NoEligibleMachine(msg)) if msg.contains("abc")));
}

#[tokio::test]
async fn allocate_with_rejected_constraint_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{API}/machines/")))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"zone": ["No such zone: 'nowhere'."]})),
        )
        .mount(&server)
        .await;

    let result = client(&server)
        .machines()
        .allocator()
        .with_zone("nowhere")
        .allocate()
        .await;

    assert!(matches!(result, Err(Error::InvalidConstraint(_))));
}

#[tokio::test]
async fn allocate_with_zone_returns_machine_in_zone() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{API}/machines/")))
        .and(query_param("op", "allocate"))
        .and(body_string_contains("zone=az1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(machine("Allocated")))
        .expect(1)
        .mount(&server)
        .await;

    let machine = client(&server)
        .machines()
        .allocator()
        .with_zone("az1")
        .allocate()
        .await
        .unwrap();

    assert_eq!(machine.zone().name(), "az1");
    assert_eq!(machine.status(), &MachineStatus::Allocated);
    assert_eq!(machine.system_id().as_str(), "e37xxm");
}

#[tokio::test]
async fn ephemeral_deploy_is_accepted_then_completes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{API}/machines/e37xxm/")))
        .and(query_param("op", "deploy"))
        .and(body_string_contains("osystem=custom"))
        .and(body_string_contains("distro_series=u-1804-0-k-11915-0"))
        .and(body_string_contains("ephemeral_deploy=true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(machine("Deploying")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{API}/machines/e37xxm/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(machine("Deploying")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/machines/e37xxm/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(machine("Deployed")))
        .mount(&server)
        .await;

    let client = client(&server);
    let accepted = client
        .machines()
        .machine(SystemId::parse_str("e37xxm").unwrap())
        .deployer()
        .set_os_system("custom")
        .set_distro_series("u-1804-0-k-11915-0")
        .set_ephemeral_deploy(true)
        .deploy()
        .await
        .unwrap();

    // Accepted is not complete.
    assert_eq!(accepted.status(), &MachineStatus::Deploying);

    let mut current = accepted;
    for _ in 0..5 {
        if current.status() == &MachineStatus::Deployed {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        current = current.get().await.unwrap();
    }

    assert_eq!(current.status(), &MachineStatus::Deployed);
    assert_eq!(current.os_system(), "custom");
    assert_eq!(current.distro_series(), "u-1804-0-k-11915-0");
    assert_eq!(current.deploy_mode(), DeployMode::Ephemeral);
}

#[tokio::test]
async fn swap_size_round_trips() {
    let server = MockServer::start().await;
    let mut updated = machine("Deployed");
    updated["swap_size"] = json!(10);

    Mock::given(method("PUT"))
        .and(path(format!("{API}/machines/e37xxm/")))
        .and(body_string_contains("swap_size=10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(updated))
        .expect(1)
        .mount(&server)
        .await;

    let machine = client(&server)
        .machines()
        .machine(SystemId::parse_str("e37xxm").unwrap())
        .modifier()
        .set_swap_size(10)
        .update()
        .await
        .unwrap();

    assert_eq!(machine.swap_size(), Some(10));
}

#[tokio::test]
async fn negative_swap_size_is_rejected_remotely() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(format!("{API}/machines/e37xxm/")))
        .and(body_string_contains("swap_size=-1"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({
                "swap_size": ["Ensure this value is greater than or equal to 0."]
            })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server)
        .machines()
        .machine(SystemId::parse_str("e37xxm").unwrap())
        .modifier()
        .set_swap_size(-1)
        .update()
        .await;

    assert!(matches!(result, Err(Error::BadRequest(_))));
}

#[tokio::test]
async fn releasing_twice_fails_the_second_time() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{API}/machines/e37xxm/")))
        .and(query_param("op", "release"))
        .and(body_string_contains("comment=releaseaan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(machine("Releasing")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{API}/machines/e37xxm/")))
        .and(query_param("op", "release"))
        .respond_with(ResponseTemplate::new(409).set_body_string(
            "Machine cannot be released in its current state ('Ready').",
        ))
        .mount(&server)
        .await;

    let handle = client(&server)
        .machines()
        .machine(SystemId::parse_str("e37xxm").unwrap());

    let released = handle.releaser().with_comment("releaseaan").release().await.unwrap();
    assert_eq!(released.status(), &MachineStatus::Releasing);

    let second = handle.releaser().with_comment("releaseaan").release().await;
    assert!(matches!(second, Err(Error::Conflict(_))));
}

#[tokio::test]
async fn get_unknown_machine_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/machines/zzzzzz/")))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;

    let result = client(&server)
        .machines()
        .get(&SystemId::parse_str("zzzzzz").unwrap())
        .await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn dns_resources_list_and_filter() {
    let server = MockServer::start().await;
    let all = json!([
        {"id": 1, "fqdn": "web.maas", "address_ttl": null, "ip_addresses": [{"ip": "10.0.0.10"}]},
        {"id": 2, "fqdn": "db.maas", "address_ttl": 30, "ip_addresses": []}
    ]);

    Mock::given(method("GET"))
        .and(path(format!("{API}/dnsresources/")))
        .and(query_param("fqdn", "db.maas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([all[1].clone()])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/dnsresources/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(all))
        .mount(&server)
        .await;

    let dns = client(&server).dns_resources();

    let everything = dns.list(None).await.unwrap();
    assert_eq!(everything.len(), 2);

    let filters = DnsResourceListParams::new().with_fqdn("db.maas");
    let matching = dns.list(Some(&filters)).await.unwrap();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].fqdn(), "db.maas");
    assert_eq!(matching[0].address_ttl(), Some(30));

    let missing = DnsResourceListParams::new().with_fqdn("bad-doesntexist.maas");
    Mock::given(method("GET"))
        .and(path(format!("{API}/dnsresources/")))
        .and(query_param("fqdn", "bad-doesntexist.maas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .with_priority(1)
        .mount(&server)
        .await;
    let none = dns.list(Some(&missing)).await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn dns_resource_lifecycle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{API}/dnsresources/")))
        .and(body_string_contains("fqdn=test-unit1.maas.sc"))
        .and(body_string_contains("address_ttl=10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7, "fqdn": "test-unit1.maas.sc", "address_ttl": 10, "ip_addresses": []
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{API}/dnsresources/7/")))
        .and(body_string_contains("ip_addresses=1.2.3.4+5.6.7.8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "fqdn": "test-unit1.maas.sc",
            "address_ttl": 10,
            "ip_addresses": [{"ip": "1.2.3.4"}, {"ip": "5.6.7.8"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{API}/dnsresources/7/")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let dns = client(&server).dns_resources();
    let created = dns
        .builder()
        .with_fqdn("test-unit1.maas.sc")
        .with_address_ttl(10)
        .create()
        .await
        .unwrap();
    assert!(created.ip_addresses().is_empty());

    let updated = created
        .modifier()
        .set_ip_addresses(["1.2.3.4", "5.6.7.8"])
        .modify()
        .await
        .unwrap();
    assert_eq!(updated.ip_addresses(), vec!["1.2.3.4", "5.6.7.8"]);

    updated.delete().await.unwrap();
}
